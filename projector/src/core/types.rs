//! Shared deterministic types for projector core logic.
//!
//! These types define stable contracts between the parser, the builder and the
//! orchestrator. They carry no I/O handles and serialize deterministically.

use serde::{Deserialize, Serialize};

/// Lifecycle flag of a parsed operation.
///
/// `Pending` operations have not yet been covered by a fold pass. Completion is
/// batch-wide: every pending operation flips once a fold pass runs, whatever its
/// action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Pending,
    Completed,
}

/// Typed edit instruction decoded from one payload block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Create or overwrite the file at `path` with `content`.
    CreateFile { path: String, content: String },
    /// Shell command proposed by the generator. Tracked, never executed.
    RunCommand { command: String },
    /// Free text found between instruction blocks.
    Comment { text: String },
}

/// One parsed instruction plus its lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(flatten)]
    pub action: Action,
    pub status: OperationStatus,
}

impl Operation {
    /// Wrap an action as a freshly parsed (pending) operation.
    pub fn pending(action: Action) -> Self {
        Self {
            action,
            status: OperationStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    /// Short label for logs and round summaries.
    pub fn label(&self) -> String {
        match &self.action {
            Action::CreateFile { path, .. } => format!("create {path}"),
            Action::RunCommand { command } => format!("run {command}"),
            Action::Comment { text } => {
                let first = text.lines().next().unwrap_or_default();
                format!("note {first}")
            }
        }
    }
}

/// Which generation request produced a round of operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundKind {
    /// Initial scaffold payload.
    Template,
    /// Follow-up payload answering a user prompt.
    Chat,
}

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged message of the conversation sent as generation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serializes_with_flat_kind_tag() {
        let op = Operation::pending(Action::CreateFile {
            path: "/index.html".to_string(),
            content: "<html></html>".to_string(),
        });
        let value = serde_json::to_value(&op).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "create_file",
                "path": "/index.html",
                "content": "<html></html>",
                "status": "pending",
            })
        );
    }

    #[test]
    fn message_serializes_lowercase_role() {
        let value = serde_json::to_value(Message::assistant("ok")).expect("serialize");
        assert_eq!(value, serde_json::json!({"role": "assistant", "content": "ok"}));
    }
}

//! Observable state of one build session.
//!
//! A session owns the append-only operation list, the current project tree
//! and the conversation used as generation context. Observers hold a shared
//! reference and read snapshots; only the orchestrator mutates it.

use crate::core::builder::{FoldOutcome, fold_pending};
use crate::core::mount::{MountDescriptor, project};
use crate::core::parser::parse;
use crate::core::path::find_node;
use crate::core::types::{Message, Operation};
use crate::tree::TreeNode;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No scaffold has been requested yet.
    Init,
    /// A generation request is outstanding (or the last one failed).
    Generating,
    /// The last round completed; ready for a follow-up prompt.
    Idle,
}

#[derive(Debug, Clone)]
pub struct BuildSession {
    phase: SessionPhase,
    template_set: bool,
    context_prompts: Vec<String>,
    operations: Vec<Operation>,
    tree: Vec<TreeNode>,
    conversation: Vec<Message>,
    rounds: u32,
}

impl Default for BuildSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Init,
            template_set: false,
            context_prompts: Vec::new(),
            operations: Vec::new(),
            tree: Vec::new(),
            conversation: Vec::new(),
            rounds: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the scaffold round has been applied.
    pub fn template_set(&self) -> bool {
        self.template_set
    }

    /// Context prompts returned by the scaffold request.
    pub fn context_prompts(&self) -> &[String] {
        &self.context_prompts
    }

    /// Every operation parsed so far, in arrival order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn pending_count(&self) -> usize {
        self.operations.iter().filter(|op| op.is_pending()).count()
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    /// Number of payload rounds ingested.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Content of the file at `path`, if the tree holds one there.
    pub fn file_content(&self, path: &str) -> Option<&str> {
        find_node(&self.tree, path)?.content()
    }

    /// Mount descriptor for the current tree.
    pub fn descriptor(&self) -> MountDescriptor {
        project(&self.tree)
    }

    /// Parse `payload` and append its operations as pending. Returns how many
    /// operations were appended.
    pub fn ingest(&mut self, payload: &str) -> usize {
        let ops = parse(payload);
        let added = ops.len();
        self.operations.extend(ops);
        self.rounds += 1;
        added
    }

    /// Fold every pending operation into the tree.
    ///
    /// Returns `None` when nothing was pending; the tree is untouched then.
    pub fn sync(&mut self) -> Option<FoldOutcome> {
        let outcome = fold_pending(&self.tree, &mut self.operations)?;
        self.tree = outcome.tree.clone();
        Some(outcome)
    }

    /// Messages sent ahead of a new user prompt.
    ///
    /// Until a chat round has succeeded the conversation is empty, and the
    /// scaffold's context prompts stand in for it.
    pub(crate) fn chat_context(&self, prompt: &str) -> Vec<Message> {
        let mut messages = if self.conversation.is_empty() {
            self.context_prompts.iter().map(Message::user).collect()
        } else {
            self.conversation.clone()
        };
        messages.push(Message::user(prompt));
        messages
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_template(&mut self, context_prompts: Vec<String>) {
        self.context_prompts = context_prompts;
        self.template_set = true;
    }

    /// Record a completed chat exchange.
    pub(crate) fn record_exchange(&mut self, request: Vec<Message>, response: &str) {
        self.conversation = request;
        self.conversation.push(Message::assistant(response));
    }
}

//! Test-only helpers: tree and operation builders plus scripted capabilities.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::mount::MountDescriptor;
use crate::core::path::segments;
use crate::core::types::{Action, Message, Operation};
use crate::io::generation::{GenerationService, TemplateResponse};
use crate::io::sandbox::Sandbox;
use crate::tree::{NodeKind, TreeNode};

fn last_segment(path: &str) -> String {
    segments(path).last().copied().unwrap_or_default().to_string()
}

/// File node at `path`, named after its last segment.
pub fn file(path: &str, content: &str) -> TreeNode {
    TreeNode::file(last_segment(path), path, content)
}

/// Directory node at `path` holding `children` in the given order.
pub fn dir(path: &str, children: Vec<TreeNode>) -> TreeNode {
    TreeNode {
        name: last_segment(path),
        path: path.to_string(),
        kind: NodeKind::Directory { children },
    }
}

pub fn create_file(path: &str, content: &str) -> Operation {
    Operation::pending(Action::CreateFile {
        path: path.to_string(),
        content: content.to_string(),
    })
}

pub fn run_command(command: &str) -> Operation {
    Operation::pending(Action::RunCommand {
        command: command.to_string(),
    })
}

pub fn comment(text: &str) -> Operation {
    Operation::pending(Action::Comment {
        text: text.to_string(),
    })
}

/// Render one `createFile` block in the payload wire format.
pub fn file_block(path: &str, content: &str) -> String {
    format!(
        "<boltAction type=\"file\" action=\"createFile\" path=\"{path}\">\n{content}\n</boltAction>"
    )
}

/// Render one `runCommand` block in the payload wire format.
pub fn command_block(command: &str) -> String {
    format!("<boltAction action=\"runCommand\">{command}</boltAction>")
}

/// One scripted answer to a chat request.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Respond(String),
    Fail(String),
}

/// Generation service that replays canned responses and records requests.
#[derive(Debug)]
pub struct ScriptedGeneration {
    template: Option<TemplateResponse>,
    replies: RefCell<VecDeque<ScriptedReply>>,
    template_prompts: RefCell<Vec<String>>,
    chat_requests: RefCell<Vec<Vec<Message>>>,
}

impl ScriptedGeneration {
    /// `template: None` makes every template request fail.
    pub fn new(template: Option<TemplateResponse>, replies: Vec<ScriptedReply>) -> Self {
        Self {
            template,
            replies: RefCell::new(replies.into()),
            template_prompts: RefCell::new(Vec::new()),
            chat_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn template_prompts(&self) -> Vec<String> {
        self.template_prompts.borrow().clone()
    }

    pub fn chat_requests(&self) -> Vec<Vec<Message>> {
        self.chat_requests.borrow().clone()
    }
}

impl GenerationService for ScriptedGeneration {
    fn template(&self, prompt: &str) -> Result<TemplateResponse> {
        self.template_prompts.borrow_mut().push(prompt.to_string());
        self.template
            .clone()
            .ok_or_else(|| anyhow!("template backend unavailable"))
    }

    fn chat(&self, messages: &[Message]) -> Result<String> {
        self.chat_requests.borrow_mut().push(messages.to_vec());
        match self.replies.borrow_mut().pop_front() {
            Some(ScriptedReply::Respond(payload)) => Ok(payload),
            Some(ScriptedReply::Fail(reason)) => Err(anyhow!(reason)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

/// Sandbox that records every mounted descriptor, optionally failing instead.
#[derive(Debug, Default)]
pub struct RecordingSandbox {
    mounts: RefCell<Vec<MountDescriptor>>,
    fail: bool,
}

impl RecordingSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sandbox whose every mount attempt fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn mounts(&self) -> Vec<MountDescriptor> {
        self.mounts.borrow().clone()
    }

    pub fn last_mount(&self) -> Option<MountDescriptor> {
        self.mounts.borrow().last().cloned()
    }
}

impl Sandbox for RecordingSandbox {
    fn mount(&self, descriptor: &MountDescriptor) -> Result<()> {
        if self.fail {
            return Err(anyhow!("sandbox offline"));
        }
        self.mounts.borrow_mut().push(descriptor.clone());
        Ok(())
    }
}

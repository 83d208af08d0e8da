//! Orchestration of a build session: generation rounds, folding and mounting.
//!
//! The [`Orchestrator`] drives a [`BuildSession`] through its lifecycle:
//!
//! 1. `start` requests the scaffold, applies its first payload, then sends the
//!    user's prompt (prefixed by the scaffold's context prompts) as the first
//!    chat round.
//! 2. `submit` sends a follow-up prompt with the accumulated conversation.
//!
//! Every round parses its payload, appends the operations, folds the pending
//! batch into the tree and, when a sandbox is attached, mounts the full
//! descriptor. A round that writes no file leaves the tree and the sandbox
//! untouched.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, info, instrument, warn};

use crate::core::builder::PathConflict;
use crate::core::types::RoundKind;
use crate::io::generation::{GenerationError, GenerationRequest, GenerationService};
use crate::io::round_log::{RoundMeta, RoundWriteRequest, write_round};
use crate::io::sandbox::{MountError, Sandbox};
use crate::session::{BuildSession, SessionPhase};

/// Result of applying one payload round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Round number (1-indexed, counts template and chat rounds).
    pub round: u32,
    pub kind: RoundKind,
    /// Operations parsed from the payload.
    pub operations_added: usize,
    /// Canonical paths of files created or overwritten.
    pub files_written: Vec<String>,
    /// File operations rejected because of a kind mismatch on their path.
    pub conflicts: Vec<PathConflict>,
    /// Whether the updated tree was handed to a sandbox.
    pub mounted: bool,
}

/// Both rounds run by [`Orchestrator::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub template: RoundOutcome,
    pub chat: RoundOutcome,
}

pub struct Orchestrator<G, S> {
    service: G,
    sandbox: Option<S>,
    session: BuildSession,
    log_dir: Option<PathBuf>,
}

impl<G: GenerationService, S: Sandbox> Orchestrator<G, S> {
    /// Orchestrator with a fresh session and no sandbox yet.
    pub fn new(service: G) -> Self {
        Self {
            service,
            sandbox: None,
            session: BuildSession::new(),
            log_dir: None,
        }
    }

    /// Write per-round artifacts under `log_dir`.
    pub fn with_round_log(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    pub fn session(&self) -> &BuildSession {
        &self.session
    }

    pub fn service(&self) -> &G {
        &self.service
    }

    pub fn sandbox(&self) -> Option<&S> {
        self.sandbox.as_ref()
    }

    /// Make a sandbox available and mount the current tree into it right away,
    /// so rounds applied before the sandbox was ready are not lost.
    pub fn attach_sandbox(&mut self, sandbox: S) -> Result<()> {
        self.sandbox = Some(sandbox);
        self.mount_current()?;
        Ok(())
    }

    /// Request the scaffold for `prompt`, apply it, then run the first chat
    /// round.
    ///
    /// A failed scaffold request leaves the session in `Init`. A failed chat
    /// request leaves it `Generating` with the scaffold applied; `submit` can
    /// retry.
    #[instrument(skip_all)]
    pub fn start(&mut self, prompt: &str) -> Result<StartOutcome> {
        if self.session.phase() != SessionPhase::Init || self.session.template_set() {
            bail!("session already started");
        }

        let response = self
            .service
            .template(prompt)
            .map_err(|source| GenerationError {
                request: GenerationRequest::Template,
                source,
            })?;
        debug!(
            prompts = response.prompts.len(),
            payloads = response.ui_prompts.len(),
            "scaffold received"
        );
        if response.ui_prompts.len() > 1 {
            debug!(
                ignored = response.ui_prompts.len() - 1,
                "only the first scaffold payload is applied"
            );
        }

        let payload = response.ui_prompts.first().cloned().unwrap_or_default();
        self.session.set_template(response.prompts);
        let template = self.apply_round(RoundKind::Template, &payload)?;

        let chat = self.generate(prompt)?;
        Ok(StartOutcome { template, chat })
    }

    /// Send a follow-up prompt and apply the returned payload.
    #[instrument(skip_all)]
    pub fn submit(&mut self, prompt: &str) -> Result<RoundOutcome> {
        if !self.session.template_set() {
            bail!("no scaffold yet; start the session first");
        }
        self.generate(prompt)
    }

    fn generate(&mut self, prompt: &str) -> Result<RoundOutcome> {
        self.session.set_phase(SessionPhase::Generating);
        let request = self.session.chat_context(prompt);
        let response = self
            .service
            .chat(&request)
            .map_err(|source| GenerationError {
                request: GenerationRequest::Chat,
                source,
            })?;

        self.session.record_exchange(request, &response);
        let outcome = self.apply_round(RoundKind::Chat, &response)?;
        self.session.set_phase(SessionPhase::Idle);
        Ok(outcome)
    }

    fn apply_round(&mut self, kind: RoundKind, payload: &str) -> Result<RoundOutcome> {
        let operations_added = self.session.ingest(payload);
        let round = self.session.rounds();
        let first_new = self.session.operations().len() - operations_added;
        for op in &self.session.operations()[first_new..] {
            debug!(round, op = %op.label(), "operation parsed");
        }

        let (files_written, conflicts, mount_result) = match self.session.sync() {
            Some(fold) => {
                for conflict in &fold.conflicts {
                    warn!(round, %conflict, "file operation skipped");
                }
                let mount_result = if fold.written.is_empty() {
                    Ok(false)
                } else {
                    self.mount_current()
                };
                (fold.written, fold.conflicts, mount_result)
            }
            None => (Vec::new(), Vec::new(), Ok(false)),
        };
        let mounted = matches!(mount_result, Ok(true));

        let outcome = RoundOutcome {
            round,
            kind,
            operations_added,
            files_written,
            conflicts,
            mounted,
        };
        info!(
            round,
            operations = outcome.operations_added,
            files = outcome.files_written.len(),
            conflicts = outcome.conflicts.len(),
            mounted,
            "round applied"
        );

        if let Some(log_dir) = &self.log_dir {
            self.log_round(log_dir, &outcome, payload)?;
        }
        mount_result?;
        Ok(outcome)
    }

    /// Mount the current tree if a sandbox is attached. Returns whether a mount
    /// happened.
    fn mount_current(&self) -> Result<bool> {
        let Some(sandbox) = &self.sandbox else {
            debug!("no sandbox attached; projection deferred");
            return Ok(false);
        };
        sandbox
            .mount(&self.session.descriptor())
            .map_err(|source| MountError { source })?;
        Ok(true)
    }

    fn log_round(&self, log_dir: &Path, outcome: &RoundOutcome, payload: &str) -> Result<()> {
        let start = self.session.operations().len() - outcome.operations_added;
        let meta = RoundMeta {
            round: outcome.round,
            kind: outcome.kind,
            operations: outcome.operations_added,
            files_written: outcome.files_written.len(),
            conflicts: outcome.conflicts.iter().map(ToString::to_string).collect(),
            mounted: outcome.mounted,
        };
        let paths = write_round(&RoundWriteRequest {
            log_dir,
            meta: &meta,
            payload,
            operations: &self.session.operations()[start..],
            tree: self.session.tree(),
            descriptor: &self.session.descriptor(),
        })?;
        debug!(dir = %paths.dir.display(), "round logged");
        Ok(())
    }
}

//! Incremental file-system projector for generated web projects.
//!
//! A generator streams instruction payloads: tag-wrapped blocks that create
//! files or propose commands. This crate decodes those payloads into
//! operations, folds them into an in-memory project tree, and projects the
//! tree into the nested descriptor a sandbox mounts. The architecture keeps a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (parsing, tree folding, projection,
//!   invariants). No I/O, fully testable in isolation.
//! - **[`io`]**: Side effects (generation backend, sandbox mounting, snapshots,
//!   config, round logs). Behind traits where tests need fakes.
//!
//! [`orchestrator`] coordinates both over a [`session::BuildSession`] to run
//! the prompt-driven build lifecycle.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod orchestrator;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;

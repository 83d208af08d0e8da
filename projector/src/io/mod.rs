//! I/O helpers for projector commands.

pub mod config;
pub mod generation;
pub mod round_log;
pub mod sandbox;
pub mod tree_store;

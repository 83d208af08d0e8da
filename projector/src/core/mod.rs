//! Deterministic, pure logic shared by the projector.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod builder;
pub mod invariants;
pub mod mount;
pub mod parser;
pub mod path;
pub mod types;

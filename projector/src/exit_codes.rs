//! Stable exit codes for projector CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input, config or tree snapshot, or any other error.
pub const INVALID: i32 = 1;
/// A generation request (scaffold or chat) failed.
pub const GENERATION_FAILED: i32 = 2;
/// Mounting the project into the sandbox failed.
pub const MOUNT_FAILED: i32 = 3;

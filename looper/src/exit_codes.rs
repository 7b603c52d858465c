//! Stable exit codes for looper CLI commands.

/// The pass completed.
pub const OK: i32 = 0;
/// Reading the source, the config, or writing output failed.
pub const FAILED: i32 = 1;
/// The content violated a rule (missing property, duplicate, bad reference...).
pub const CONTENT_ERROR: i32 = 2;

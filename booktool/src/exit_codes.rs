//! Stable exit codes for booktool commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Fatal error: bad arguments or config, or a batch aborted by `--fail-fast`.
pub const FAILURE: i32 = 1;
/// Command finished, but one or more files failed and were skipped.
pub const PARTIAL: i32 = 2;

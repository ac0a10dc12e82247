//! Stable exit codes for deckrun CLI commands.

/// Command succeeded; every job (if any) exited with status zero.
pub const OK: i32 = 0;
/// Invalid project, config, arguments or deck, or any other error.
pub const INVALID: i32 = 1;
/// At least one job failed, timed out or could not run.
pub const JOB_FAILED: i32 = 2;
/// The deck could not be restored after a job; the batch stopped.
pub const RESTORE_FAILED: i32 = 3;

//! Command-line utility for managing eBook files (EPUB and audiobooks).
//!
//! The crate is split along one seam:
//!
//! - **Reporting ([`logging`], [`report`])**: the verbosity threshold chosen at
//!   startup and the three reporting helpers every operation goes through.
//!   INFO records are the mutation log: each change to a file is reported
//!   exactly once, marked `applied` or `dry-run`.
//! - **Collaborators ([`fsops`], [`audio`], [`epub`], [`sanitize`], [`isbn`])**:
//!   the operations themselves, built on `walkdir`, `id3`, `symphonia` and `zip`.
//!
//! [`commands`] runs collaborators over many files via [`batch`], under the
//! failure policy from [`config`].

pub mod audio;
pub mod batch;
pub mod commands;
pub mod config;
pub mod epub;
pub mod exit_codes;
pub mod fsops;
pub mod isbn;
pub mod logging;
pub mod report;
pub mod sanitize;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

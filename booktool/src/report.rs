//! Reporting entry points shared by every command.
//!
//! Each helper emits exactly one record at a fixed level; whether it shows up
//! is decided by the threshold installed in [`crate::logging`].
//!
//! - [`report_mutation`]: `info`, one per logical change, applied or not.
//! - [`report_condition`]: `warn`, anything outside normal running conditions.
//! - [`report_trace`]: `debug`, everything else worth knowing while debugging.

use std::fmt;

use tracing::{debug, info, warn};

/// A change to a file's content or metadata, about to be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationEvent<'a> {
    pub description: &'a str,
    pub dry_run: bool,
}

impl MutationEvent<'_> {
    /// Marker prefixed to the description.
    pub fn marker(&self) -> &'static str {
        if self.dry_run { "dry-run" } else { "applied" }
    }
}

impl fmt::Display for MutationEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.marker(), self.description)
    }
}

/// Report a mutation. Callers invoke this once per change attempted, even
/// when `dry_run` suppresses the write.
pub fn report_mutation(description: &str, dry_run: bool) {
    let event = MutationEvent {
        description,
        dry_run,
    };
    info!("{event}");
}

pub fn report_condition(description: &str) {
    warn!("{description}");
}

pub fn report_trace(description: &str) {
    debug!("{description}");
}

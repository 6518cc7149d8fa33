//! Verbosity threshold and the process-wide tracing sink.
//!
//! The threshold is chosen once at startup from the number of `-v` flags and
//! never changes afterwards:
//!
//! | flags  | threshold | visible records                         |
//! |--------|-----------|-----------------------------------------|
//! | (none) | `warn`    | conditions                              |
//! | `-v`   | `info`    | conditions, mutations (applied/dry-run) |
//! | `-vv`  | `debug`   | everything                              |
//!
//! Output goes to stderr in compact format so stdout stays free for command
//! results (`duration`, `sanitize`, `isbn10`).

use std::fmt;
use std::io::{IsTerminal, Write};

use tracing::Subscriber;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt as tfmt, layer::SubscriberExt};

/// Logging threshold, ordered from least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerbosityLevel {
    Warning,
    Info,
    Debug,
}

impl VerbosityLevel {
    /// Filter directive understood by `EnvFilter`.
    pub fn directive(self) -> &'static str {
        match self {
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for VerbosityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// Map a count of repeated `-v` flags to a threshold. Saturates at `Debug`.
pub fn resolve_level(count: u8) -> VerbosityLevel {
    match count {
        0 => VerbosityLevel::Warning,
        1 => VerbosityLevel::Info,
        _ => VerbosityLevel::Debug,
    }
}

/// Build a subscriber that filters at `level` and writes compact records to `writer`.
pub fn build_subscriber<W>(
    level: VerbosityLevel,
    writer: W,
    ansi: bool,
) -> impl Subscriber + Send + Sync
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::new(level.directive());

    tracing_subscriber::registry().with(filter).with(
        tfmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .compact(),
    )
}

/// Holds the installed sink for the lifetime of one invocation.
///
/// Dropping the guard uninstalls the subscriber and flushes stderr.
pub struct LoggingGuard {
    level: VerbosityLevel,
    _default: DefaultGuard,
}

impl LoggingGuard {
    pub fn level(&self) -> VerbosityLevel {
        self.level
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the stderr sink at `level`.
///
/// # Example
/// ```bash
/// booktool -vv --dry-run rename "Some Chapter.mp3"
/// ```
pub fn init(level: VerbosityLevel) -> LoggingGuard {
    let ansi = std::io::stderr().is_terminal();
    let subscriber = build_subscriber(level, std::io::stderr, ansi);
    let default = tracing::subscriber::set_default(subscriber);
    LoggingGuard {
        level,
        _default: default,
    }
}

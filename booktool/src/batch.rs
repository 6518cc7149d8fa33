//! Per-item driver for commands that touch many files.

use std::path::Path;

use anyhow::Result;

use crate::config::ErrorPolicy;
use crate::report::{report_condition, report_trace};

/// Outcome counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.processed - self.failed
    }

    pub fn merge(&mut self, other: BatchSummary) {
        self.processed += other.processed;
        self.failed += other.failed;
    }
}

/// Settle one failed item under `policy`.
///
/// [`ErrorPolicy::Skip`] reports the error as a condition and returns `Ok`;
/// [`ErrorPolicy::Abort`] returns it with `label` attached as context.
pub fn on_failure(policy: ErrorPolicy, label: &str, err: anyhow::Error) -> Result<()> {
    match policy {
        ErrorPolicy::Skip => {
            report_condition(&format!("{label}: {err:#}"));
            Ok(())
        }
        ErrorPolicy::Abort => Err(err.context(label.to_string())),
    }
}

impl BatchSummary {
    /// Trace the counts and report a condition when anything failed.
    pub fn finish(&self) {
        report_trace(&format!(
            "batch finished: {} processed, {} failed",
            self.processed, self.failed
        ));
        if self.failed > 0 {
            report_condition(&format!(
                "{} of {} items failed",
                self.failed, self.processed
            ));
        }
    }
}

/// Apply `op` to every path in order, settling failures with [`on_failure`].
pub fn run_batch<P, I, F>(items: I, policy: ErrorPolicy, mut op: F) -> Result<BatchSummary>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<()>,
{
    let mut summary = BatchSummary::default();
    for item in items {
        let path = item.as_ref();
        summary.processed += 1;
        if let Err(err) = op(path) {
            on_failure(policy, &path.display().to_string(), err)?;
            summary.failed += 1;
        }
    }
    summary.finish();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{VerbosityLevel, build_subscriber};
    use crate::test_support::CapturedLogs;
    use anyhow::bail;

    fn fail_on_odd(path: &Path) -> Result<()> {
        let n: u32 = path.to_str().and_then(|s| s.parse().ok()).unwrap_or(0);
        if n % 2 == 1 {
            bail!("odd");
        }
        Ok(())
    }

    #[test]
    fn skip_policy_counts_failures_and_continues() {
        let mut seen = Vec::new();
        let summary = run_batch(["1", "2", "3", "4", "5"], ErrorPolicy::Skip, |path| {
            seen.push(path.to_path_buf());
            fail_on_odd(path)
        })
        .expect("batch");
        assert_eq!(seen.len(), 5);
        assert_eq!(
            summary,
            BatchSummary {
                processed: 5,
                failed: 3
            }
        );
        assert_eq!(summary.succeeded(), 2);
    }

    #[test]
    fn abort_policy_stops_at_first_failure() {
        let mut seen = Vec::new();
        let err = run_batch(["2", "3", "4"], ErrorPolicy::Abort, |path| {
            seen.push(path.to_path_buf());
            fail_on_odd(path)
        })
        .expect_err("should abort");
        assert_eq!(seen.len(), 2);
        assert_eq!(format!("{err:#}"), "3: odd");
    }

    #[test]
    fn skipped_failures_are_reported_with_summary() {
        let logs = CapturedLogs::new();
        let subscriber = build_subscriber(VerbosityLevel::Warning, logs.clone(), false);
        tracing::subscriber::with_default(subscriber, || {
            run_batch(["a.mp3", "b.mp3"], ErrorPolicy::Skip, |path| {
                if path == Path::new("b.mp3") {
                    bail!("malformed tag");
                }
                Ok(())
            })
            .expect("batch");
        });
        let lines = logs.lines();
        assert_eq!(lines.len(), 2, "{lines:?}");
        assert!(lines[0].contains("b.mp3: malformed tag"));
        assert!(lines[1].contains("1 of 2 items failed"));
    }

    #[test]
    fn on_failure_follows_policy() {
        assert!(on_failure(ErrorPolicy::Skip, "a.mp3", anyhow::anyhow!("bad")).is_ok());
        let err = on_failure(ErrorPolicy::Abort, "a.mp3", anyhow::anyhow!("bad"))
            .expect_err("abort");
        assert_eq!(format!("{err:#}"), "a.mp3: bad");
    }

    #[test]
    fn empty_batch_is_clean() {
        let summary =
            run_batch(Vec::<String>::new(), ErrorPolicy::Abort, |_| Ok(())).expect("batch");
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn merge_adds_counts() {
        let mut total = BatchSummary {
            processed: 2,
            failed: 1,
        };
        total.merge(BatchSummary {
            processed: 3,
            failed: 0,
        });
        assert_eq!(total.processed, 5);
        assert_eq!(total.failed, 1);
    }
}

//! Batch commands behind the CLI subcommands.
//!
//! Each command walks its inputs through [`run_batch`], so one bad file is
//! reported and skipped (or aborts the run, per [`ErrorPolicy`]) and the
//! returned [`BatchSummary`] decides the exit code.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::audio::AudioFilter;
use crate::audio::duration::duration_secs;
use crate::audio::group::{flatten_discs as flatten_group, group_by_album};
use crate::audio::track::{TrackInfo, set_track_info};
use crate::batch::{BatchSummary, on_failure, run_batch};
use crate::config::{Config, ErrorPolicy};
use crate::fsops::{chmod, find_files, list_dir, move_path};
use crate::report::report_trace;
use crate::sanitize::sanitize;

/// Settings shared by every command of one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub policy: ErrorPolicy,
    pub filter: AudioFilter,
}

impl RunOptions {
    /// `fail_fast` overrides the configured policy with [`ErrorPolicy::Abort`].
    pub fn from_config(config: &Config, dry_run: bool, fail_fast: bool) -> Self {
        Self {
            dry_run,
            policy: if fail_fast {
                ErrorPolicy::Abort
            } else {
                config.on_error
            },
            filter: AudioFilter::new(&config.audio_extensions),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), false, false)
    }
}

/// Run `op` over the audio files directly inside each of `dirs`.
///
/// Directories that cannot be listed count as failed items.
fn for_each_book<F>(dirs: &[PathBuf], opts: &RunOptions, mut op: F) -> Result<BatchSummary>
where
    F: FnMut(&Path, Vec<PathBuf>) -> Result<BatchSummary>,
{
    let mut files = BatchSummary::default();
    let books = run_batch(dirs, opts.policy, |dir| {
        let tracks = list_dir(dir, |p| opts.filter.is_audio(p))?;
        report_trace(&format!("{}: found {} tracks", dir.display(), tracks.len()));
        files.merge(op(dir, tracks)?);
        Ok(())
    })?;
    files.failed += books.failed;
    Ok(files)
}

/// Set each track's number to the one in its file name, and its total to
/// the number of tracks in the book.
pub fn fix_track_numbers(dirs: &[PathBuf], opts: &RunOptions) -> Result<BatchSummary> {
    for_each_book(dirs, opts, |_, tracks| {
        run_batch(&tracks, opts.policy, |track| {
            let info = TrackInfo::from_path(track, &opts.filter)?;
            set_track_info(track, info, opts.dry_run)?;
            Ok(())
        })
    })
}

/// Renumber multi-disc sets in each book as a single run of tracks.
///
/// Each album group is one unit of work: a failing group counts all of its
/// files as failed, and files without artist or album tags count as failed
/// on their own.
pub fn flatten_discs(dirs: &[PathBuf], opts: &RunOptions) -> Result<BatchSummary> {
    for_each_book(dirs, opts, |dir, tracks| {
        let groups = group_by_album(&tracks);
        let mut summary = BatchSummary::default();
        for (path, err) in groups.unreadable {
            summary.processed += 1;
            on_failure(opts.policy, &path.display().to_string(), err)?;
            summary.failed += 1;
        }
        for ((artist, album), group) in groups.albums {
            summary.processed += group.len();
            let label = format!("{}: {artist} / {album}", dir.display());
            match flatten_group(&group, &opts.filter, opts.dry_run) {
                Ok(true) => {}
                Ok(false) => report_trace(&format!("{label}: left as is")),
                Err(err) => {
                    on_failure(opts.policy, &label, err)?;
                    summary.failed += group.len();
                }
            }
        }
        summary.finish();
        Ok(summary)
    })
}

/// Total playing time in seconds. Directories expand to the audio files
/// directly inside them.
pub fn total_duration(paths: &[PathBuf], opts: &RunOptions) -> Result<(f64, BatchSummary)> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(list_dir(path, |p| opts.filter.is_audio(p))?);
        } else {
            files.push(path.clone());
        }
    }
    let mut total = 0.0;
    let summary = run_batch(&files, opts.policy, |file| {
        total += duration_secs(file)?;
        Ok(())
    })?;
    Ok((total, summary))
}

/// Destination for [`rename`]: sanitized stem, original extension, same directory.
pub fn sanitized_path(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("{}: file name is not valid UTF-8", path.display()))?;
    let mut name = sanitize(stem)?;
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    Ok(path.with_file_name(name))
}

/// Rename each file to its sanitized name.
pub fn rename(paths: &[PathBuf], opts: &RunOptions) -> Result<BatchSummary> {
    run_batch(paths, opts.policy, |path| {
        let dst = sanitized_path(path)?;
        move_path(path, &dst, opts.dry_run)?;
        Ok(())
    })
}

/// Set permission bits on each path. With `recursive`, directories expand to
/// every file beneath them.
pub fn chmod_all(
    paths: &[PathBuf],
    mode: u32,
    recursive: bool,
    opts: &RunOptions,
) -> Result<BatchSummary> {
    let mut targets = Vec::new();
    for path in paths {
        if recursive && path.is_dir() {
            targets.extend(find_files(path, |_| true)?.into_iter().map(|entry| entry.path));
        } else {
            targets.push(path.clone());
        }
    }
    run_batch(&targets, opts.policy, |path| chmod(path, mode, opts.dry_run))
}

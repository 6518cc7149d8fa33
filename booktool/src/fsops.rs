//! Filesystem traversal and the two filesystem mutations (`chmod`, move).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

use crate::report::{report_condition, report_mutation, report_trace};

/// A file found by [`find_files`] with its basic metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub len: u64,
    /// Permission bits (`& 0o777`); zero where the platform has none.
    pub mode: u32,
}

/// Recursively collect files under `root` whose path satisfies `keep`.
///
/// Entries are visited in file-name order. Entries that cannot be read are
/// reported and skipped; a missing `root` is an error.
pub fn find_files(root: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<FileEntry>> {
    if !root.exists() {
        bail!("no such file or directory: {}", root.display());
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                report_condition(&format!("skipping unreadable entry: {err}"));
                continue;
            }
        };
        if entry.file_type().is_dir() || !keep(entry.path()) {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                report_condition(&format!("{}: {err}", entry.path().display()));
                continue;
            }
        };
        out.push(FileEntry {
            path: entry.into_path(),
            len: metadata.len(),
            mode: permission_bits(&metadata),
        });
    }
    report_trace(&format!("found {} files under {}", out.len(), root.display()));
    Ok(out)
}

/// Immediate children of `dir` whose path satisfies `keep`, sorted.
pub fn list_dir(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && keep(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &fs::Metadata) -> u32 {
    0
}

/// Set the permission bits of `path` to `mode` unless they already match.
#[cfg(unix)]
pub fn chmod(path: &Path, mode: u32, dry_run: bool) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let current = permission_bits(&metadata);
    if current == mode {
        report_trace(&format!("{}: mode already {mode:o}", path.display()));
        return Ok(());
    }
    report_mutation(
        &format!("{}: chmod {current:o} -> {mode:o}", path.display()),
        dry_run,
    );
    if !dry_run {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("chmod {}", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn chmod(path: &Path, _mode: u32, _dry_run: bool) -> Result<()> {
    report_condition(&format!(
        "{}: chmod is not supported on this platform",
        path.display()
    ));
    Ok(())
}

/// Move `src` to `dst`, returning where the file now lives.
///
/// Nothing happens when both resolve to the same path. A missing `src` or a
/// different, existing `dst` is an error, in dry-run too. Missing parent directories of `dst` are created.
pub fn move_path(src: &Path, dst: &Path, dry_run: bool) -> Result<PathBuf> {
    if !src.exists() {
        bail!("{} does not exist", src.display());
    }
    let resolved_src = resolve(src)?;
    let resolved_dst = resolve(dst)?;
    if resolved_src == resolved_dst {
        report_trace(&format!("{}: already at destination", src.display()));
        return Ok(src.to_path_buf());
    }
    if dst.exists() {
        bail!("{} already exists", dst.display());
    }
    report_mutation(
        &format!("{}: move -> {}", src.display(), dst.display()),
        dry_run,
    );
    if dry_run {
        return Ok(src.to_path_buf());
    }
    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::rename(src, dst)
        .with_context(|| format!("move {} -> {}", src.display(), dst.display()))?;
    Ok(dst.to_path_buf())
}

/// Canonical form of `path`, tolerating a final component that does not exist yet.
fn resolve(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("resolve {}", path.display()));
    }
    let absolute = std::path::absolute(path)
        .with_context(|| format!("resolve {}", path.display()))?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => Ok(parent
            .canonicalize()
            .with_context(|| format!("resolve {}", parent.display()))?
            .join(name)),
        _ => Ok(absolute),
    }
}

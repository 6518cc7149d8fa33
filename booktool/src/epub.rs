//! Packing and unpacking EPUB containers.
//!
//! An EPUB is a zip archive whose first entry is an uncompressed `mimetype`
//! file holding exactly [`MIMETYPE`], with `META-INF/container.xml` pointing
//! at the package document.

use std::fs::{self, File, FileTimes};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::report::{report_mutation, report_trace};

pub const MIMETYPE: &str = "application/epub+zip";

/// Check that `source` looks like an unpacked EPUB.
fn check_tree(source: &Path) -> Result<()> {
    if !source.is_dir() {
        bail!("{} is not a directory", source.display());
    }
    let mimetype_path = source.join("mimetype");
    let mimetype = fs::read_to_string(&mimetype_path)
        .with_context(|| format!("read {}", mimetype_path.display()))?;
    if mimetype != MIMETYPE {
        bail!("{} does not consist of {MIMETYPE:?}", mimetype_path.display());
    }
    let container_path = source.join("META-INF").join("container.xml");
    if !container_path.is_file() {
        bail!("missing file {}", container_path.display());
    }
    Ok(())
}

/// Zip the EPUB tree at `source` into `target`.
///
/// Refuses to overwrite an existing `target` unless `clobber` is set. The
/// archive inherits the access and modification times of `source`.
pub fn compress(source: &Path, target: &Path, clobber: bool, dry_run: bool) -> Result<()> {
    check_tree(source)?;
    if target.exists() && !clobber {
        bail!("{} already exists", target.display());
    }
    report_mutation(
        &format!("{}: compress -> {}", source.display(), target.display()),
        dry_run,
    );
    if dry_run {
        return Ok(());
    }

    let file = File::create(target).with_context(|| format!("create {}", target.display()))?;
    let mut zip = ZipWriter::new(file);

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    zip.start_file("mimetype", stored).context("start mimetype entry")?;
    zip.write_all(MIMETYPE.as_bytes()).context("write mimetype entry")?;

    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", source.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("relative path of {}", entry.path().display()))?;
        if rel == Path::new("mimetype") {
            continue;
        }
        let name = archive_name(rel);
        report_trace(&format!("adding {name}"));
        zip.start_file(name.as_str(), deflated)
            .with_context(|| format!("start entry {name}"))?;
        let mut input =
            File::open(entry.path()).with_context(|| format!("open {}", entry.path().display()))?;
        io::copy(&mut input, &mut zip).with_context(|| format!("write entry {name}"))?;
    }
    zip.finish().context("finish archive")?;

    let source_meta = fs::metadata(source).with_context(|| format!("stat {}", source.display()))?;
    let times = FileTimes::new()
        .set_accessed(source_meta.accessed().context("source access time")?)
        .set_modified(source_meta.modified().context("source modification time")?);
    File::options()
        .write(true)
        .open(target)
        .and_then(|f| f.set_times(times))
        .with_context(|| format!("set times on {}", target.display()))?;
    Ok(())
}

/// Entry names always use `/`, whatever the platform separator.
fn archive_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Unpack the EPUB at `source` into `target`.
///
/// Existing files are overwritten; files in `target` that the archive does not
/// contain are left in place.
pub fn decompress(source: &Path, target: &Path, dry_run: bool) -> Result<()> {
    let file = File::open(source).with_context(|| format!("open {}", source.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("read archive {}", source.display()))?;
    report_mutation(
        &format!(
            "{}: decompress {} entries -> {}",
            source.display(),
            archive.len(),
            target.display()
        ),
        dry_run,
    );
    if dry_run {
        return Ok(());
    }
    fs::create_dir_all(target).with_context(|| format!("create {}", target.display()))?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("read entry {index} of {}", source.display()))?;
        let Some(rel) = entry.enclosed_name() else {
            bail!("{}: unsafe entry name {:?}", source.display(), entry.name());
        };
        let outpath = target.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&outpath)
                .with_context(|| format!("create {}", outpath.display()))?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        report_trace(&format!("extracting {}", outpath.display()));
        let mut outfile =
            File::create(&outpath).with_context(|| format!("create {}", outpath.display()))?;
        io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("write {}", outpath.display()))?;
    }
    Ok(())
}

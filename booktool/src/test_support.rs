//! Test-only helpers: log capture and on-disk fixtures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use id3::{Tag, TagLike, Version};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory log sink usable as a `MakeWriter`.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured output split into non-empty lines.
    pub fn lines(&self) -> Vec<String> {
        let buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }
}

pub struct CapturedWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buf: Arc::clone(&self.buf),
        }
    }
}

/// Scratch directory for a test, removed on drop.
pub struct TestDir {
    temp: tempfile::TempDir,
}

impl TestDir {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { temp })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.temp.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Create an MP3 stand-in carrying an ID3 tag built from `frames`.
    ///
    /// The file holds no audio, which is enough for tag reads and writes.
    pub fn mp3(&self, rel: &str, frames: &[(&str, &str)]) -> Result<PathBuf> {
        let path = self.write(rel, b"")?;
        let mut tag = Tag::new();
        for (id, text) in frames {
            tag.set_text(*id, *text);
        }
        tag.write_to_path(&path, Version::Id3v24)
            .with_context(|| format!("write tag {}", path.display()))?;
        Ok(path)
    }

    /// Lay out a minimal unpacked EPUB under `rel`.
    pub fn epub_tree(&self, rel: &str) -> Result<PathBuf> {
        self.write(&format!("{rel}/mimetype"), b"application/epub+zip")?;
        self.write(
            &format!("{rel}/META-INF/container.xml"),
            br#"<?xml version="1.0"?><container version="1.0"/>"#,
        )?;
        self.write(&format!("{rel}/OEBPS/content.opf"), b"<package/>")?;
        self.write(&format!("{rel}/OEBPS/text/ch01.xhtml"), b"<html/>")?;
        Ok(self.temp.path().join(rel))
    }
}

/// Read a single text frame from an MP3 fixture.
pub fn read_frame(path: &Path, id: &str) -> Result<Option<String>> {
    let tag = Tag::read_from_path(path).with_context(|| format!("read tag {}", path.display()))?;
    Ok(tag
        .get(id)
        .and_then(|frame| frame.content().text())
        .map(str::to_owned))
}

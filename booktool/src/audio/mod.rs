//! Audiobook files: recognition, track/disc tags, grouping and duration.
//!
//! Tag editing goes through ID3 (MP3). MP4-family files are recognized as
//! audio, so they count toward track totals and durations, but tag
//! operations on them fail with an "unsupported" error.

pub mod duration;
pub mod group;
pub mod track;

use std::fmt;
use std::path::Path;

use anyhow::{Result, bail};

/// Extensions recognized as audiobook tracks unless configured otherwise.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "mp4", "m4a", "m4b", "m4p"];

/// Decides which paths are audio files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFilter {
    extensions: Vec<String>,
}

impl Default for AudioFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl AudioFilter {
    pub fn new<S: AsRef<str>>(extensions: impl IntoIterator<Item = S>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Hidden files never count, whatever their extension.
    pub fn is_audio(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Container family, which decides how tags are accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Mp4,
}

impl AudioFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "mp3" => Ok(Self::Mp3),
            "mp4" | "m4a" | "m4b" | "m4p" => Ok(Self::Mp4),
            _ => bail!("{}: not a recognized audio container", path.display()),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mp3 => f.write_str("MP3"),
            Self::Mp4 => f.write_str("MP4"),
        }
    }
}

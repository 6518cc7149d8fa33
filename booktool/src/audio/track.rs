//! Track and disc numbers, artist and album, read from and written to ID3 tags.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use id3::{ErrorKind, Tag, TagLike, Version};
use regex::Regex;

use super::{AudioFilter, AudioFormat};
use crate::fsops::list_dir;
use crate::report::{report_mutation, report_trace};

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// `(track_number, total_tracks)`, rendered as `n/total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    pub number: u32,
    pub total: u32,
}

impl TrackInfo {
    /// Infer the track from the filesystem: the number is the first run of
    /// digits in the file stem, the total is the count of audio files next to it.
    pub fn from_path(path: &Path, filter: &AudioFilter) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("{}: file name is not valid UTF-8", path.display()))?;
        let digits = DIGITS_RE.find(stem).ok_or_else(|| {
            anyhow!(
                "cannot infer track from {}: expected one or more digits in the file stem",
                path.display()
            )
        })?;
        let number = digits
            .as_str()
            .parse::<u32>()
            .with_context(|| format!("track number in {}", path.display()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let total = list_dir(dir, |p| filter.is_audio(p))?.len() as u32;
        Ok(Self { number, total })
    }
}

impl FromStr for TrackInfo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (number, total) = s
            .split_once('/')
            .ok_or_else(|| anyhow!("expected two numbers separated by '/' (got {s:?})"))?;
        Ok(Self {
            number: number.trim().parse::<u32>().with_context(|| format!("track in {s:?}"))?,
            total: total.trim().parse::<u32>().with_context(|| format!("total in {s:?}"))?,
        })
    }
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.total)
    }
}

/// Disc position: `n` or `n/total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscInfo {
    pub index: u32,
    pub total: Option<u32>,
}

impl FromStr for DiscInfo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (index, total) = match s.split_once('/') {
            Some((index, total)) => (index, Some(total)),
            None => (s, None),
        };
        let index = index.trim().parse::<u32>().with_context(|| format!("disc in {s:?}"))?;
        let total = total
            .map(|t| t.trim().parse::<u32>().with_context(|| format!("disc total in {s:?}")))
            .transpose()?;
        Ok(Self { index, total })
    }
}

fn ensure_id3(path: &Path) -> Result<()> {
    match AudioFormat::from_path(path)? {
        AudioFormat::Mp3 => Ok(()),
        format => bail!(
            "{}: tag editing is not supported for {format} files",
            path.display()
        ),
    }
}

/// Read the ID3 tag of `path`; `None` when the file has no tag yet.
fn read_tag(path: &Path) -> Result<Option<Tag>> {
    ensure_id3(path)?;
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(Some(tag)),
        Err(err) if matches!(err.kind, ErrorKind::NoTag) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("read tag {}", path.display())),
    }
}

/// ID3v2.2 cannot be written back, so it is upgraded to v2.3.
fn write_tag(path: &Path, tag: &Tag) -> Result<()> {
    let version = match tag.version() {
        Version::Id3v22 => {
            report_trace(&format!(
                "{}: upgrading unsupported ID3 v2.2 to v2.3",
                path.display()
            ));
            Version::Id3v23
        }
        version => version,
    };
    tag.write_to_path(path, version)
        .with_context(|| format!("write tag {}", path.display()))
}

fn text_frame(tag: &Tag, id: &str) -> Option<String> {
    tag.get(id)
        .and_then(|frame| frame.content().text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

/// Track info from the tag when it holds `n/total`, otherwise from the path.
///
/// A bare `n` in the tag that disagrees with the number in the file name is
/// an error unless `ignore_conflicts` is set.
pub fn get_track_info(
    path: &Path,
    filter: &AudioFilter,
    ignore_conflicts: bool,
) -> Result<TrackInfo> {
    let text = read_tag(path)?.and_then(|tag| text_frame(&tag, "TRCK"));
    if let Some(text) = text.as_deref() {
        match text.parse::<TrackInfo>() {
            Ok(info) => return Ok(info),
            Err(err) => report_trace(&format!(
                "{}: unable to parse TRCK {text:?}: {err:#}",
                path.display()
            )),
        }
    }
    let inferred = TrackInfo::from_path(path, filter)?;
    if !ignore_conflicts {
        if let Some(tagged) = text.and_then(|t| t.parse::<u32>().ok()) {
            if tagged != inferred.number {
                bail!(
                    "{}: metadata conflicts with filename: {tagged} != {}",
                    path.display(),
                    inferred.number
                );
            }
        }
    }
    Ok(inferred)
}

/// Write `info` as the track tag. Returns `false` when the tag already matches.
pub fn set_track_info(path: &Path, info: TrackInfo, dry_run: bool) -> Result<bool> {
    let mut tag = read_tag(path)?.unwrap_or_else(Tag::new);
    let wanted = info.to_string();
    let existing = text_frame(&tag, "TRCK");
    if let Some(existing) = existing.as_deref() {
        report_trace(&format!("{}: existing TRCK {existing:?}", path.display()));
        if existing == wanted {
            return Ok(false);
        }
    }
    report_mutation(
        &format!(
            "{}: set track {} -> {wanted}",
            path.display(),
            existing.as_deref().unwrap_or("(none)")
        ),
        dry_run,
    );
    tag.set_text("TRCK", wanted);
    if !dry_run {
        write_tag(path, &tag)?;
    }
    Ok(true)
}

pub fn get_disc(path: &Path) -> Result<Option<DiscInfo>> {
    let Some(text) = read_tag(path)?.and_then(|tag| text_frame(&tag, "TPOS")) else {
        return Ok(None);
    };
    let disc = text
        .parse::<DiscInfo>()
        .with_context(|| format!("{}: malformed TPOS", path.display()))?;
    Ok(Some(disc))
}

/// Remove the disc tag. Returns `false` when there was none.
pub fn del_disc(path: &Path, dry_run: bool) -> Result<bool> {
    let Some(mut tag) = read_tag(path)? else {
        return Ok(false);
    };
    let Some(existing) = text_frame(&tag, "TPOS") else {
        return Ok(false);
    };
    report_mutation(
        &format!("{}: remove disc {existing}", path.display()),
        dry_run,
    );
    tag.remove("TPOS");
    if !dry_run {
        write_tag(path, &tag)?;
    }
    Ok(true)
}

/// First name listed in the artist tag.
pub fn get_artist(path: &Path) -> Result<String> {
    let text = read_tag(path)?
        .and_then(|tag| text_frame(&tag, "TPE1"))
        .ok_or_else(|| anyhow!("{}: no artist tag", path.display()))?;
    let first = text
        .split(['/', '\0'])
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(text.as_str());
    Ok(first.to_string())
}

pub fn get_album(path: &Path) -> Result<String> {
    read_tag(path)?
        .and_then(|tag| text_frame(&tag, "TALB"))
        .ok_or_else(|| anyhow!("{}: no album tag", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestDir, read_frame};

    #[test]
    fn track_info_parses_slash_pair() {
        let info: TrackInfo = "3/12".parse().expect("parse");
        assert_eq!(info, TrackInfo { number: 3, total: 12 });
        assert_eq!(info.to_string(), "3/12");
        assert!("3".parse::<TrackInfo>().is_err());
        assert!("3/x".parse::<TrackInfo>().is_err());
    }

    #[test]
    fn disc_info_accepts_optional_total() {
        assert_eq!(
            "2".parse::<DiscInfo>().expect("parse"),
            DiscInfo { index: 2, total: None }
        );
        assert_eq!(
            "1/2".parse::<DiscInfo>().expect("parse"),
            DiscInfo {
                index: 1,
                total: Some(2)
            }
        );
    }

    #[test]
    fn from_path_uses_first_digits_and_sibling_count() {
        let dir = TestDir::new().expect("dir");
        dir.write("book/Chapter 07 - part 2.mp3", b"").expect("write");
        dir.write("book/Chapter 08.mp3", b"").expect("write");
        dir.write("book/cover.jpg", b"").expect("write");
        let info = TrackInfo::from_path(
            &dir.path().join("book/Chapter 07 - part 2.mp3"),
            &AudioFilter::default(),
        )
        .expect("infer");
        assert_eq!(info, TrackInfo { number: 7, total: 2 });
    }

    #[test]
    fn from_path_requires_digits() {
        let dir = TestDir::new().expect("dir");
        let path = dir.write("Prologue.mp3", b"").expect("write");
        let err = TrackInfo::from_path(&path, &AudioFilter::default()).expect_err("no digits");
        assert!(err.to_string().contains("expected one or more digits"));
    }

    #[test]
    fn get_prefers_complete_tag() {
        let dir = TestDir::new().expect("dir");
        let path = dir.mp3("05.mp3", &[("TRCK", "2/9")]).expect("mp3");
        let info = get_track_info(&path, &AudioFilter::default(), false).expect("get");
        assert_eq!(info, TrackInfo { number: 2, total: 9 });
    }

    #[test]
    fn get_falls_back_to_path_and_detects_conflicts() {
        let dir = TestDir::new().expect("dir");
        let path = dir.mp3("05.mp3", &[("TRCK", "4")]).expect("mp3");
        let filter = AudioFilter::default();
        let err = get_track_info(&path, &filter, false).expect_err("conflict");
        assert!(err.to_string().contains("metadata conflicts with filename"));

        let info = get_track_info(&path, &filter, true).expect("ignore conflicts");
        assert_eq!(info, TrackInfo { number: 5, total: 1 });
    }

    #[test]
    fn set_writes_tag_once() {
        let dir = TestDir::new().expect("dir");
        let path = dir.mp3("01.mp3", &[("TRCK", "1")]).expect("mp3");
        let info = TrackInfo { number: 1, total: 3 };
        assert!(set_track_info(&path, info, false).expect("set"));
        assert_eq!(read_frame(&path, "TRCK").expect("read").as_deref(), Some("1/3"));
        assert!(!set_track_info(&path, info, false).expect("set again"));
    }

    #[test]
    fn set_dry_run_leaves_file_untouched() {
        let dir = TestDir::new().expect("dir");
        let path = dir.mp3("01.mp3", &[("TRCK", "1")]).expect("mp3");
        assert!(set_track_info(&path, TrackInfo { number: 1, total: 3 }, true).expect("set"));
        assert_eq!(read_frame(&path, "TRCK").expect("read").as_deref(), Some("1"));
    }

    #[test]
    fn mp4_tags_are_unsupported() {
        let dir = TestDir::new().expect("dir");
        let path = dir.write("01.m4b", b"").expect("write");
        let err = set_track_info(&path, TrackInfo { number: 1, total: 1 }, true)
            .expect_err("unsupported");
        assert!(err.to_string().contains("not supported for MP4"));
    }

    #[test]
    fn disc_read_and_delete() {
        let dir = TestDir::new().expect("dir");
        let path = dir.mp3("01.mp3", &[("TPOS", "2/3")]).expect("mp3");
        assert_eq!(
            get_disc(&path).expect("disc"),
            Some(DiscInfo {
                index: 2,
                total: Some(3)
            })
        );
        assert!(del_disc(&path, false).expect("delete"));
        assert_eq!(get_disc(&path).expect("disc"), None);
        assert!(!del_disc(&path, false).expect("delete again"));
    }

    #[test]
    fn artist_takes_first_name() {
        let dir = TestDir::new().expect("dir");
        let path = dir
            .mp3("01.mp3", &[("TPE1", "Neil Gaiman/Terry Pratchett"), ("TALB", "Good Omens")])
            .expect("mp3");
        assert_eq!(get_artist(&path).expect("artist"), "Neil Gaiman");
        assert_eq!(get_album(&path).expect("album"), "Good Omens");
    }

    #[test]
    fn untagged_file_has_no_artist() {
        let dir = TestDir::new().expect("dir");
        let path = dir.write("01.mp3", b"").expect("write");
        assert!(get_artist(&path).is_err());
        assert_eq!(get_disc(&path).expect("disc"), None);
    }
}

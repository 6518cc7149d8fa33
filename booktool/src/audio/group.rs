//! Album grouping and multi-disc flattening.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::AudioFilter;
use super::track::{
    TrackInfo, del_disc, get_album, get_artist, get_disc, get_track_info, set_track_info,
};
use crate::report::report_trace;

/// `(artist, album)` identifying one audiobook.
pub type AlbumKey = (String, String);

/// Result of [`group_by_album`].
#[derive(Debug, Default)]
pub struct AlbumGroups {
    pub albums: BTreeMap<AlbumKey, Vec<PathBuf>>,
    /// Files whose artist or album could not be read, with the reason.
    pub unreadable: Vec<(PathBuf, anyhow::Error)>,
}

/// Group `paths` by artist and album. Files whose tags cannot be read are
/// left out of every group and returned in [`AlbumGroups::unreadable`].
pub fn group_by_album(paths: &[PathBuf]) -> AlbumGroups {
    let mut groups = AlbumGroups::default();
    for path in paths {
        match album_key(path) {
            Ok(key) => groups.albums.entry(key).or_default().push(path.clone()),
            Err(err) => groups.unreadable.push((path.clone(), err)),
        }
    }
    groups
}

fn album_key(path: &Path) -> Result<AlbumKey> {
    Ok((get_artist(path)?, get_album(path)?))
}

/// Flatten a multi-disc set into one run of track numbers.
///
/// `paths` is one group (same artist and album). Applies only when every
/// file has a track number and a nonzero disc index and more than one disc is
/// present; each track is then shifted by the number of tracks on preceding
/// discs, the total becomes the group size, and the disc tag is removed.
/// Returns whether the group was flattened.
pub fn flatten_discs(paths: &[PathBuf], filter: &AudioFilter, dry_run: bool) -> Result<bool> {
    let mut tracks = Vec::with_capacity(paths.len());
    for path in paths {
        let disc = get_disc(path)?.map(|disc| disc.index).filter(|index| *index > 0);
        let track = get_track_info(path, filter, true).ok().map(|info| info.number);
        match (disc, track) {
            (Some(disc), Some(track)) => tracks.push((path, disc, track)),
            _ => {
                report_trace(&format!(
                    "{}: missing disc or track number, not a flattenable set",
                    path.display()
                ));
                return Ok(false);
            }
        }
    }

    let mut disc_counts: BTreeMap<u32, u32> = BTreeMap::new();
    for (_, disc, _) in &tracks {
        *disc_counts.entry(*disc).or_default() += 1;
    }
    if disc_counts.len() < 2 {
        report_trace("single disc, nothing to flatten");
        return Ok(false);
    }

    let mut offsets = BTreeMap::new();
    let mut preceding = 0;
    for (disc, count) in &disc_counts {
        offsets.insert(*disc, preceding);
        preceding += count;
    }
    report_trace(&format!("flattening {} discs", disc_counts.len()));

    let total = paths.len() as u32;
    for (path, disc, track) in tracks {
        let info = TrackInfo {
            number: track + offsets[&disc],
            total,
        };
        set_track_info(path, info, dry_run)?;
        del_disc(path, dry_run)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::DiscInfo;
    use crate::test_support::{TestDir, read_frame};

    fn two_disc_set(dir: &TestDir) -> Vec<PathBuf> {
        vec![
            dir.mp3("a/d1t1.mp3", &[("TPOS", "1/2"), ("TRCK", "1/2")]).expect("mp3"),
            dir.mp3("a/d1t2.mp3", &[("TPOS", "1/2"), ("TRCK", "2/2")]).expect("mp3"),
            dir.mp3("a/d2t1.mp3", &[("TPOS", "2/2"), ("TRCK", "1/1")]).expect("mp3"),
        ]
    }

    #[test]
    fn flattens_two_disc_set() {
        let dir = TestDir::new().expect("dir");
        let paths = two_disc_set(&dir);
        assert!(flatten_discs(&paths, &AudioFilter::default(), false).expect("flatten"));

        let numbers: Vec<_> = paths
            .iter()
            .map(|p| read_frame(p, "TRCK").expect("read").expect("TRCK"))
            .collect();
        assert_eq!(numbers, vec!["1/3", "2/3", "3/3"]);
        for path in &paths {
            assert_eq!(get_disc(path).expect("disc"), None::<DiscInfo>);
        }
    }

    #[test]
    fn dry_run_flatten_changes_nothing() {
        let dir = TestDir::new().expect("dir");
        let paths = two_disc_set(&dir);
        assert!(flatten_discs(&paths, &AudioFilter::default(), true).expect("flatten"));
        assert_eq!(read_frame(&paths[2], "TRCK").expect("read").as_deref(), Some("1/1"));
        assert!(get_disc(&paths[2]).expect("disc").is_some());
    }

    #[test]
    fn single_disc_is_left_alone() {
        let dir = TestDir::new().expect("dir");
        let paths = vec![
            dir.mp3("a/1.mp3", &[("TPOS", "1"), ("TRCK", "1/2")]).expect("mp3"),
            dir.mp3("a/2.mp3", &[("TPOS", "1"), ("TRCK", "2/2")]).expect("mp3"),
        ];
        assert!(!flatten_discs(&paths, &AudioFilter::default(), false).expect("flatten"));
        assert_eq!(read_frame(&paths[1], "TRCK").expect("read").as_deref(), Some("2/2"));
    }

    #[test]
    fn missing_disc_is_left_alone() {
        let dir = TestDir::new().expect("dir");
        let paths = vec![
            dir.mp3("a/1.mp3", &[("TPOS", "1"), ("TRCK", "1/2")]).expect("mp3"),
            dir.mp3("a/2.mp3", &[("TRCK", "2/2")]).expect("mp3"),
        ];
        assert!(!flatten_discs(&paths, &AudioFilter::default(), false).expect("flatten"));
    }

    #[test]
    fn groups_by_artist_and_album() {
        let dir = TestDir::new().expect("dir");
        let a1 = dir.mp3("1.mp3", &[("TPE1", "Ann"), ("TALB", "One")]).expect("mp3");
        let b1 = dir.mp3("2.mp3", &[("TPE1", "Bo"), ("TALB", "Two")]).expect("mp3");
        let a2 = dir.mp3("3.mp3", &[("TPE1", "Ann"), ("TALB", "One")]).expect("mp3");
        let untagged = dir.write("4.mp3", b"").expect("write");

        let groups = group_by_album(&[a1.clone(), b1.clone(), a2.clone(), untagged.clone()]);
        assert_eq!(groups.albums.len(), 2);
        assert_eq!(groups.albums[&("Ann".to_string(), "One".to_string())], vec![a1, a2]);
        assert_eq!(groups.albums[&("Bo".to_string(), "Two".to_string())], vec![b1]);
        assert_eq!(groups.unreadable.len(), 1);
        assert_eq!(groups.unreadable[0].0, untagged);
    }
}

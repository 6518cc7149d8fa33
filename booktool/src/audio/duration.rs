//! Playing time of audio files, probed with Symphonia.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use crate::report::report_trace;

/// Duration of `path` in seconds, read from the container without decoding.
pub fn duration_secs(path: &Path) -> Result<f64> {
    report_trace(&format!("reading duration of {}", path.display()));
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("probe {}", path.display()))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| anyhow!("{}: no audio track found", path.display()))?;
    let params = &track.codec_params;
    let frames = params
        .n_frames
        .ok_or_else(|| anyhow!("{}: container does not record a length", path.display()))?;
    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
        .ok_or_else(|| anyhow!("{}: unknown time base", path.display()))?;
    Ok(frames_to_secs(time_base, frames))
}

fn frames_to_secs(time_base: TimeBase, frames: u64) -> f64 {
    let time = time_base.calc_time(frames);
    time.seconds as f64 + time.frac
}

//! Tool configuration loaded from a TOML file (`--config`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_EXTENSIONS;

/// What to do when one item of a batch fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Report the failure and continue with the remaining items.
    #[default]
    Skip,
    /// Stop at the first failure.
    Abort,
}

/// booktool configuration (TOML).
///
/// Missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub on_error: ErrorPolicy,

    /// Permission bits applied by `chmod` when `--mode` is not given.
    pub file_mode: u32,

    /// File extensions (without the dot) treated as audiobook tracks.
    pub audio_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            on_error: ErrorPolicy::Skip,
            file_mode: 0o644,
            audio_extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.file_mode > 0o777 {
            return Err(anyhow!(
                "file_mode must be at most 0o777 (got {:#o})",
                self.file_mode
            ));
        }
        if self.audio_extensions.is_empty() {
            return Err(anyhow!("audio_extensions must not be empty"));
        }
        if let Some(bad) = self
            .audio_extensions
            .iter()
            .find(|ext| ext.trim().is_empty() || ext.starts_with('.'))
        {
            return Err(anyhow!(
                "audio_extensions entries must be bare extensions like \"mp3\" (got {bad:?})"
            ));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `Config::default()`.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let cfg = Config::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

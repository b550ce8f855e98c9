//! YAML asset configuration.
//!
//! The document names the two external tools and, per category, whether it is enabled, the
//! output extension, and extra ffmpeg arguments:
//!
//! ```yaml
//! vgmstream_path: vgmstream-cli
//! ffmpeg_path: ffmpeg
//! music:
//!   enable: true
//!   extension: .opus
//!   ffmpeg_args: ["-c:a", "libopus", "-b:a", "96k"]
//! jackets: { enable: true, extension: .webp }
//! images: { enable: true, extension: .webp }
//! audio: { enable: false, extension: .opus }
//! ```
//!
//! The rest of the crate only asks three questions of a `Config`: `is_enabled`,
//! `extension_for`, and `extra_args_for`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use serde::Deserialize;

use crate::category::Category;
use crate::{Error, Result};

/// Per-category settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub enable: bool,

    /// Output file extension, e.g. `.opus`. A missing leading dot is added on load.
    pub extension: String,

    /// Extra arguments inserted between ffmpeg's inputs and its output path.
    #[serde(default)]
    pub ffmpeg_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub vgmstream_path: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub music: CategoryConfig,
    pub jackets: CategoryConfig,
    pub images: CategoryConfig,
    pub audio: CategoryConfig,
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&text).map_err(|err| match err {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse and validate a config document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let parse = || -> anyhow::Result<Self> {
            let mut config: Config =
                serde_yml::from_str(text).context("failed to parse asset config")?;

            ensure!(
                !config.vgmstream_path.as_os_str().is_empty(),
                "vgmstream_path must not be empty"
            );
            ensure!(
                !config.ffmpeg_path.as_os_str().is_empty(),
                "ffmpeg_path must not be empty"
            );

            for category in Category::ALL {
                let section = config.section_mut(category);
                let ext = section.extension.trim();
                ensure!(
                    !ext.is_empty() && ext != ".",
                    "{category}.extension must not be empty"
                );
                section.extension = if ext.starts_with('.') {
                    ext.to_owned()
                } else {
                    format!(".{ext}")
                };
            }

            Ok(config)
        };

        parse().map_err(|e| Error::Config(format!("{e:#}")))
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.section(category).enable
    }

    pub fn extension_for(&self, category: Category) -> &str {
        &self.section(category).extension
    }

    pub fn extra_args_for(&self, category: Category) -> &[String] {
        &self.section(category).ffmpeg_args
    }

    /// Force a category off (CLI `--no-*` flags).
    pub fn disable(&mut self, category: Category) {
        self.section_mut(category).enable = false;
    }

    fn section(&self, category: Category) -> &CategoryConfig {
        match category {
            Category::Jackets => &self.jackets,
            Category::Images => &self.images,
            Category::Music => &self.music,
            Category::Audio => &self.audio,
        }
    }

    fn section_mut(&mut self, category: Category) -> &mut CategoryConfig {
        match category {
            Category::Jackets => &mut self.jackets,
            Category::Images => &mut self.images,
            Category::Music => &mut self.music,
            Category::Audio => &mut self.audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
vgmstream_path: /opt/vgmstream/vgmstream-cli
ffmpeg_path: ffmpeg
music:
  enable: true
  extension: opus
  ffmpeg_args: ["-c:a", "libopus"]
jackets:
  enable: true
  extension: .webp
images:
  enable: false
  extension: .webp
audio:
  enable: true
  extension: .opus
"#;

    #[test]
    fn loads_sections_and_normalizes_extensions() -> anyhow::Result<()> {
        let config = Config::from_yaml(SAMPLE)?;

        assert!(config.is_enabled(Category::Music));
        assert!(!config.is_enabled(Category::Images));
        assert_eq!(config.extension_for(Category::Music), ".opus");
        assert_eq!(config.extension_for(Category::Jackets), ".webp");
        assert_eq!(config.extra_args_for(Category::Music), ["-c:a", "libopus"]);
        assert!(config.extra_args_for(Category::Audio).is_empty());
        Ok(())
    }

    #[test]
    fn disable_overrides_config() -> anyhow::Result<()> {
        let mut config = Config::from_yaml(SAMPLE)?;
        config.disable(Category::Audio);
        assert!(!config.is_enabled(Category::Audio));
        Ok(())
    }

    #[test]
    fn rejects_empty_extension() {
        let text = SAMPLE.replace("extension: .webp\nimages", "extension: \"\"\nimages");
        let err = Config::from_yaml(&text).unwrap_err();
        assert!(err.to_string().contains("jackets.extension"), "{err}");
    }

    #[test]
    fn rejects_missing_section() {
        let err = Config::from_yaml("vgmstream_path: a\nffmpeg_path: b\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}

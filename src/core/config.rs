use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::core::ImageFormat;

/// How the frame rate gate asks FFmpeg about a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbeStrategy {
    /// Regex over the `ffmpeg -i` diagnostic text
    #[default]
    DiagnosticText,
    /// Structured JSON from ffprobe
    Ffprobe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub probe_strategy: ProbeStrategy,
    pub default_format: ImageFormat,
    pub default_rate: String,
    pub use_native_rate: bool,
    /// Lines of FFmpeg output that fill the progress bar once
    pub progress_scale: u32,
    pub last_video_directory: Option<PathBuf>,
    pub last_output_directory: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            probe_strategy: ProbeStrategy::DiagnosticText,
            default_format: ImageFormat::Png,
            default_rate: "1".to_string(),
            use_native_rate: false,
            progress_scale: 100,
            last_video_directory: None,
            last_output_directory: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save_to(config_path)
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save_to(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        log::debug!("Saved config to {}", config_path.display());
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("frame-extractor")
            .join("config.json")
    }

    /// Progress scale clamped so the bar never divides by zero.
    pub fn effective_progress_scale(&self) -> u32 {
        self.progress_scale.max(1)
    }
}

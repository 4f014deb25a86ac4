use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use anyhow::Result;
use crate::core::AppConfig;

/// Locations of the FFmpeg binaries, resolved once from the config.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegTool {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegTool {
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();
        Self {
            ffmpeg: config.ffmpeg_path.clone().unwrap_or(defaults.ffmpeg),
            ffprobe: config.ffprobe_path.clone().unwrap_or(defaults.ffprobe),
        }
    }

    /// Run `program` to completion and capture both output streams.
    pub fn output<I, S>(program: &Path, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());

        log::debug!("Executing {:?}", command);

        command
            .output()
            .map_err(|e| anyhow::anyhow!("Failed to run {}: {}", program.display(), e))
    }
}

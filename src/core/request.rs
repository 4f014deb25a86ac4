use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use crate::core::ExtractError;

/// Extensions offered by the video file picker.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Jpg];

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingRate {
    /// Keep every decoded frame.
    Native,
    /// Frames per second, always positive and finite.
    PerSecond(f64),
}

impl SamplingRate {
    /// Parses the rate text field. Ignored when `native` is set.
    pub fn from_form(text: &str, native: bool) -> Result<Self, ExtractError> {
        if native {
            return Ok(SamplingRate::Native);
        }

        let trimmed = text.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(SamplingRate::PerSecond(value)),
            _ => Err(ExtractError::InvalidRate(trimmed.to_string())),
        }
    }

    /// The ffmpeg video filter for this rate, `None` for native sampling.
    pub fn filter(&self) -> Option<String> {
        match self {
            SamplingRate::Native => None,
            SamplingRate::PerSecond(value) => Some(format!("fps={}", value)),
        }
    }
}

/// Everything one extraction run needs, built fresh from the form on each trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub format: ImageFormat,
    pub rate: SamplingRate,
}

impl ExtractionRequest {
    pub fn from_form(
        video: &str,
        output: &str,
        format: ImageFormat,
        rate_text: &str,
        native_rate: bool,
    ) -> Result<Self, ExtractError> {
        let video = video.trim();
        let output = output.trim();
        if video.is_empty() || output.is_empty() {
            return Err(ExtractError::MissingInput);
        }

        Ok(Self {
            video_path: PathBuf::from(video),
            output_dir: PathBuf::from(output),
            format,
            rate: SamplingRate::from_form(rate_text, native_rate)?,
        })
    }

    /// ffmpeg output pattern, e.g. `<output>/frame_%04d.png`.
    pub fn output_pattern(&self) -> PathBuf {
        self.output_dir.join(format!("frame_%04d.{}", self.format.extension()))
    }
}

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use regex::Regex;
use crate::core::{AppConfig, ProbeStrategy};
use crate::video::FfmpegTool;

/// Frames per second reported for a video. Zero means the rate could not be read.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FrameRate(pub f64);

impl FrameRate {
    pub const ZERO: FrameRate = FrameRate(0.0);

    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// Asks the external tool how fast a video plays.
///
/// Implementations never fail: anything that prevents reading the rate
/// (missing binary, corrupt container, unexpected output) yields `FrameRate::ZERO`.
pub trait FrameRateProbe: Send + Sync {
    fn probe(&self, video: &Path) -> FrameRate;
}

/// Probe strategy selected by the config.
pub fn probe_for(config: &AppConfig, tool: &FfmpegTool) -> Box<dyn FrameRateProbe> {
    match config.probe_strategy {
        ProbeStrategy::DiagnosticText => Box::new(DiagnosticTextProbe::new(tool.ffmpeg.clone())),
        ProbeStrategy::Ffprobe => Box::new(FfprobeProbe::new(tool.ffprobe.clone())),
    }
}

fn fps_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?) fps").expect("fps pattern is valid"))
}

/// Reads `ffmpeg -i <video>` stderr and picks the first `<n> fps` token.
pub struct DiagnosticTextProbe {
    ffmpeg: PathBuf,
}

impl DiagnosticTextProbe {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }

    pub fn parse(diagnostics: &str) -> FrameRate {
        fps_pattern()
            .captures(diagnostics)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(FrameRate)
            .unwrap_or(FrameRate::ZERO)
    }
}

impl FrameRateProbe for DiagnosticTextProbe {
    fn probe(&self, video: &Path) -> FrameRate {
        // No output file: ffmpeg prints stream info and exits non-zero, which is expected
        let args = [std::ffi::OsStr::new("-hide_banner"), std::ffi::OsStr::new("-i"), video.as_os_str()];
        match FfmpegTool::output(&self.ffmpeg, args) {
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let rate = Self::parse(&stderr);
                if rate.is_zero() {
                    log::warn!("No fps token in FFmpeg output for {}", video.display());
                } else {
                    log::debug!("Probed {} at {}", video.display(), rate);
                }
                rate
            }
            Err(e) => {
                log::warn!("Frame rate probe failed for {}: {}", video.display(), e);
                FrameRate::ZERO
            }
        }
    }
}

/// Queries ffprobe for the first video stream's frame rate as JSON.
pub struct FfprobeProbe {
    ffprobe: PathBuf,
}

impl FfprobeProbe {
    pub fn new(ffprobe: PathBuf) -> Self {
        Self { ffprobe }
    }

    pub fn parse(json: &str) -> FrameRate {
        let info: serde_json::Value = match serde_json::from_str(json) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("ffprobe returned invalid JSON: {}", e);
                return FrameRate::ZERO;
            }
        };

        let empty_vec = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty_vec);

        streams
            .iter()
            .find(|stream| stream["codec_type"].as_str() == Some("video"))
            .and_then(|stream| {
                ["avg_frame_rate", "r_frame_rate"]
                    .iter()
                    .filter_map(|key| stream[*key].as_str())
                    .map(parse_fraction)
                    .find(|rate| !rate.is_zero())
            })
            .unwrap_or(FrameRate::ZERO)
    }
}

/// Parses `30000/1001` or a bare number. `0/0` and garbage give zero.
fn parse_fraction(text: &str) -> FrameRate {
    let value = match text.split_once('/') {
        Some((num, den)) => match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(num), Ok(den)) if den != 0.0 => num / den,
            _ => 0.0,
        },
        None => text.trim().parse::<f64>().unwrap_or(0.0),
    };

    if value.is_finite() && value > 0.0 {
        FrameRate(value)
    } else {
        FrameRate::ZERO
    }
}

impl FrameRateProbe for FfprobeProbe {
    fn probe(&self, video: &Path) -> FrameRate {
        let args = [
            std::ffi::OsStr::new("-v"),
            std::ffi::OsStr::new("quiet"),
            std::ffi::OsStr::new("-print_format"),
            std::ffi::OsStr::new("json"),
            std::ffi::OsStr::new("-show_streams"),
            video.as_os_str(),
        ];

        match FfmpegTool::output(&self.ffprobe, args) {
            Ok(output) if output.status.success() => {
                Self::parse(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                log::warn!("ffprobe exited with {} for {}", output.status, video.display());
                FrameRate::ZERO
            }
            Err(e) => {
                log::warn!("Frame rate probe failed for {}: {}", video.display(), e);
                FrameRate::ZERO
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FFMPEG_INFO: &str = "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':\n  \
        Duration: 00:00:10.00, start: 0.000000, bitrate: 1205 kb/s\n  \
        Stream #0:0(und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 1280x720, 1072 kb/s, 25 fps, 25 tbr, 12800 tbn (default)\n\
        At least one output file must be specified\n";

    #[test]
    fn test_diagnostic_text_integer_rate() {
        assert_eq!(DiagnosticTextProbe::parse(FFMPEG_INFO), FrameRate(25.0));
    }

    #[test]
    fn test_diagnostic_text_fractional_rate() {
        let text = "Stream #0:0: Video: h264, yuv420p, 1920x1080, 29.97 fps, 29.97 tbr, 90k tbn";
        assert_eq!(DiagnosticTextProbe::parse(text), FrameRate(29.97));
    }

    #[test]
    fn test_diagnostic_text_without_rate_is_zero() {
        let text = "clip.mp4: Invalid data found when processing input";
        assert!(DiagnosticTextProbe::parse(text).is_zero());
        assert!(DiagnosticTextProbe::parse("").is_zero());
    }

    #[test]
    fn test_ffprobe_json_rate() {
        let json = r#"{
            "streams": [
                { "codec_type": "audio", "avg_frame_rate": "0/0" },
                { "codec_type": "video", "avg_frame_rate": "30000/1001", "r_frame_rate": "30000/1001" }
            ]
        }"#;
        let rate = FfprobeProbe::parse(json);
        assert!((rate.0 - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_ffprobe_json_falls_back_to_real_rate() {
        let json = r#"{ "streams": [ { "codec_type": "video", "avg_frame_rate": "0/0", "r_frame_rate": "24/1" } ] }"#;
        assert_eq!(FfprobeProbe::parse(json), FrameRate(24.0));
    }

    #[test]
    fn test_ffprobe_json_without_video_is_zero() {
        assert!(FfprobeProbe::parse(r#"{ "streams": [] }"#).is_zero());
        assert!(FfprobeProbe::parse("not json").is_zero());
    }

    #[test]
    fn test_missing_tool_probes_zero() {
        let probe = DiagnosticTextProbe::new(PathBuf::from("definitely-not-a-real-ffmpeg-binary"));
        assert!(probe.probe(Path::new("clip.mp4")).is_zero());

        let probe = FfprobeProbe::new(PathBuf::from("definitely-not-a-real-ffprobe-binary"));
        assert!(probe.probe(Path::new("clip.mp4")).is_zero());
    }
}

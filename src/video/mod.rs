pub mod command;
pub mod ffmpeg;
pub mod monitor;
pub mod probe;

pub use ffmpeg::FfmpegTool;
pub use monitor::*;
pub use probe::*;

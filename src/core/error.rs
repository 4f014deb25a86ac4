use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Please select both a video file and output folder.")]
    MissingInput,

    #[error("Invalid frame rate '{0}': expected a positive number")]
    InvalidRate(String),

    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("FFmpeg diagnostic stream was not captured")]
    MissingPipe,

    #[error("I/O error while reading FFmpeg output: {0}")]
    Io(#[from] std::io::Error),
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use crate::core::{ExtractError, ExtractionRequest};

/// Creates the output directory and any missing parents.
pub fn prepare_output_dir(dir: &Path) -> Result<(), ExtractError> {
    std::fs::create_dir_all(dir).map_err(|source| ExtractError::CreateOutputDir {
        path: dir.to_path_buf(),
        source,
    })?;
    log::debug!("Output directory ensured: {}", dir.display());
    Ok(())
}

/// A fully built FFmpeg invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ExtractionCommand {
    pub fn build(ffmpeg: &Path, request: &ExtractionRequest) -> Self {
        let mut args: Vec<OsString> = vec![
            "-y".into(), // Overwrite frames from earlier runs
            "-i".into(),
            request.video_path.clone().into_os_string(),
        ];

        if let Some(filter) = request.rate.filter() {
            args.push("-vf".into());
            args.push(filter.into());
        }

        args.push(request.output_pattern().into_os_string());

        Self {
            program: ffmpeg.to_path_buf(),
            args,
        }
    }

    /// Shell-style rendering for logs.
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') {
                line.push_str(&format!(" \"{}\"", arg));
            } else {
                line.push(' ');
                line.push_str(&arg);
            }
        }
        line
    }
}

use std::collections::VecDeque;
use std::path::PathBuf;
use crate::core::{AppConfig, ExtractError, ExtractionRequest, ImageFormat};
use crate::video::{FrameRate, JobEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Modal messages shown to the user, one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    MissingInput,
    InvalidRate(String),
    Started,
    Success,
    FrameRateUnavailable,
    Failed(String),
    Cancelled,
}

impl Notice {
    pub fn kind(&self) -> NoticeKind {
        match self {
            Notice::Started | Notice::Success | Notice::Cancelled => NoticeKind::Info,
            Notice::MissingInput | Notice::InvalidRate(_) => NoticeKind::Warning,
            Notice::FrameRateUnavailable | Notice::Failed(_) => NoticeKind::Error,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notice::MissingInput => "Missing Information",
            Notice::InvalidRate(_) => "Invalid Frame Rate",
            Notice::Started => "Processing",
            Notice::Success => "Success",
            Notice::Cancelled => "Cancelled",
            Notice::FrameRateUnavailable | Notice::Failed(_) => "Error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::MissingInput => ExtractError::MissingInput.to_string(),
            Notice::InvalidRate(text) => ExtractError::InvalidRate(text.clone()).to_string(),
            Notice::Started => "Extraction started. Please wait...".to_string(),
            Notice::Success => "Frames extracted successfully!".to_string(),
            Notice::FrameRateUnavailable => "Could not determine frame rate.".to_string(),
            Notice::Failed(reason) => format!("Failed to extract frames: {}", reason),
            Notice::Cancelled => "Extraction cancelled. Frames written so far were kept.".to_string(),
        }
    }
}

/// Counts FFmpeg output lines. Not a completion percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    lines: u64,
    scale: u32,
}

impl Progress {
    pub fn new(scale: u32) -> Self {
        Self { lines: 0, scale: scale.max(1) }
    }

    pub fn reset(&mut self) {
        self.lines = 0;
    }

    pub fn advance(&mut self) {
        self.lines += 1;
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Bar fill, saturating once `scale` lines have been seen.
    pub fn fraction(&self) -> f32 {
        (self.lines as f32 / self.scale as f32).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    ExtractClicked,
    CancelClicked,
    VideoPicked(PathBuf),
    OutputPicked(PathBuf),
    NoticeDismissed,
    Job(JobEvent),
}

/// What the app must do after an event has been handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Start(ExtractionRequest),
    Cancel,
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub video_path: String,
    pub output_dir: String,
    pub rate_text: String,
    pub native_rate: bool,
    pub format: ImageFormat,
    pub phase: Phase,
    pub progress: Progress,
    pub notices: VecDeque<Notice>,
    pub probed_rate: Option<FrameRate>,
}

impl FormState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            video_path: String::new(),
            output_dir: String::new(),
            rate_text: config.default_rate.clone(),
            native_rate: config.use_native_rate,
            format: config.default_format,
            phase: Phase::Idle,
            progress: Progress::new(config.effective_progress_scale()),
            notices: VecDeque::new(),
            probed_rate: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn handle(&mut self, event: FormEvent) -> Effect {
        match event {
            FormEvent::ExtractClicked => self.on_extract(),
            FormEvent::CancelClicked => {
                if self.is_running() {
                    Effect::Cancel
                } else {
                    Effect::None
                }
            }
            FormEvent::VideoPicked(path) => {
                self.video_path = path.display().to_string();
                Effect::None
            }
            FormEvent::OutputPicked(path) => {
                self.output_dir = path.display().to_string();
                Effect::None
            }
            FormEvent::NoticeDismissed => {
                self.notices.pop_front();
                Effect::None
            }
            FormEvent::Job(job_event) => {
                self.on_job_event(job_event);
                Effect::None
            }
        }
    }

    fn on_extract(&mut self) -> Effect {
        if self.is_running() {
            return Effect::None;
        }

        let request = ExtractionRequest::from_form(
            &self.video_path,
            &self.output_dir,
            self.format,
            &self.rate_text,
            self.native_rate,
        );

        match request {
            Ok(request) => {
                self.progress.reset();
                self.probed_rate = None;
                self.phase = Phase::Running;
                Effect::Start(request)
            }
            Err(ExtractError::InvalidRate(text)) => {
                self.notices.push_back(Notice::InvalidRate(text));
                Effect::None
            }
            Err(_) => {
                self.notices.push_back(Notice::MissingInput);
                Effect::None
            }
        }
    }

    fn on_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Probed(rate) => self.probed_rate = Some(rate),
            JobEvent::Started => self.notices.push_back(Notice::Started),
            JobEvent::Line(_) => self.progress.advance(),
            JobEvent::Finished { .. } => self.finish(Notice::Success),
            JobEvent::FrameRateUnavailable => self.finish(Notice::FrameRateUnavailable),
            JobEvent::Failed(reason) => self.finish(Notice::Failed(reason)),
            JobEvent::Cancelled => self.finish(Notice::Cancelled),
        }
    }

    fn finish(&mut self, notice: Notice) {
        self.phase = Phase::Idle;
        self.notices.push_back(notice);
    }
}

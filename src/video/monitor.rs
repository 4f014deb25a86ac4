use std::process::Stdio;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use crate::core::{ExtractError, ExtractionRequest};
use crate::video::command::{prepare_output_dir, ExtractionCommand};
use crate::video::probe::{FrameRate, FrameRateProbe};
use crate::video::FfmpegTool;

/// Progress and outcome of one extraction, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Probed(FrameRate),
    /// Frame rate gate rejected the video; no extraction process was spawned.
    FrameRateUnavailable,
    Started,
    /// One non-empty line of FFmpeg diagnostic output
    Line(String),
    /// FFmpeg exited. The exit code is informational only.
    Finished { exit_code: Option<i32> },
    Cancelled,
    Failed(String),
}

impl JobEvent {
    /// Exactly one terminal event ends every job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobEvent::FrameRateUnavailable
                | JobEvent::Finished { .. }
                | JobEvent::Cancelled
                | JobEvent::Failed(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender: Arc::new(sender) }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once `cancel` has been called, immediately if it already was.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Owned by the UI while a job runs.
pub struct JobHandle {
    token: CancellationToken,
    worker: thread::JoinHandle<()>,
}

impl JobHandle {
    pub fn cancel(&self) {
        log::info!("Cancellation requested");
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Cancels and waits up to `timeout` for the worker to kill FFmpeg and exit.
    /// Returns false if the worker was still running when the timeout ran out.
    pub fn cancel_and_wait(self, timeout: Duration) -> bool {
        self.cancel();

        let deadline = Instant::now() + timeout;
        while !self.worker.is_finished() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }

        if self.worker.join().is_err() {
            log::error!("Extraction worker panicked");
        }
        true
    }
}

pub struct ExtractionJob {
    request: ExtractionRequest,
    command: ExtractionCommand,
    probe: Arc<dyn FrameRateProbe>,
}

impl ExtractionJob {
    pub fn new(
        tool: &FfmpegTool,
        probe: Arc<dyn FrameRateProbe>,
        request: ExtractionRequest,
    ) -> Self {
        let command = ExtractionCommand::build(&tool.ffmpeg, &request);
        Self { request, command, probe }
    }

    #[cfg(test)]
    pub fn with_command(mut self, command: ExtractionCommand) -> Self {
        self.command = command;
        self
    }

    /// Runs the job on a background thread and streams its events back.
    pub fn start(self) -> (JobHandle, mpsc::UnboundedReceiver<JobEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<JobEvent>();
        let token = CancellationToken::new();
        let worker_token = token.clone();

        let worker = thread::spawn(move || {
            let terminal = match self.run(&event_tx, &worker_token) {
                Ok(event) => event,
                Err(e) => {
                    log::error!("Frame extraction failed: {}", e);
                    JobEvent::Failed(e.to_string())
                }
            };
            log::info!("Extraction job finished: {:?}", terminal);
            emit(&event_tx, terminal);
        });

        (JobHandle { token, worker }, event_rx)
    }

    fn run(
        &self,
        events: &mpsc::UnboundedSender<JobEvent>,
        token: &CancellationToken,
    ) -> Result<JobEvent, ExtractError> {
        if token.is_cancelled() {
            return Ok(JobEvent::Cancelled);
        }

        prepare_output_dir(&self.request.output_dir)?;

        let rate = self.probe.probe(&self.request.video_path);
        if rate.is_zero() {
            log::warn!("Could not determine frame rate of {}", self.request.video_path.display());
            return Ok(JobEvent::FrameRateUnavailable);
        }
        emit(events, JobEvent::Probed(rate));

        if token.is_cancelled() {
            return Ok(JobEvent::Cancelled);
        }

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        rt.block_on(self.monitor(events, token))
    }

    async fn monitor(
        &self,
        events: &mpsc::UnboundedSender<JobEvent>,
        token: &CancellationToken,
    ) -> Result<JobEvent, ExtractError> {
        log::info!("Starting extraction: {}", self.command.display_line());
        emit(events, JobEvent::Started);

        let mut child = tokio::process::Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        let stderr = child.stderr.take().ok_or(ExtractError::MissingPipe)?;
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();

        let cancelled = token.cancelled();
        tokio::pin!(cancelled);

        loop {
            buf.clear();
            tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => {
                    if read? == 0 {
                        break;
                    }
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end();
                    if !line.is_empty() {
                        log::debug!("ffmpeg: {}", line);
                        emit(events, JobEvent::Line(line.to_string()));
                    }
                }
                _ = &mut cancelled => {
                    log::info!("Killing FFmpeg after cancellation");
                    child.kill().await?;
                    return Ok(JobEvent::Cancelled);
                }
            }
        }

        // Diagnostic stream closed; the process is exiting
        let status = tokio::select! {
            status = child.wait() => status?,
            _ = &mut cancelled => {
                child.kill().await?;
                return Ok(JobEvent::Cancelled);
            }
        };

        if !status.success() {
            log::warn!("FFmpeg exited with {}", status);
        }

        Ok(JobEvent::Finished { exit_code: status.code() })
    }
}

fn emit(events: &mpsc::UnboundedSender<JobEvent>, event: JobEvent) {
    if let Err(e) = events.send(event) {
        log::error!("Failed to send job event: {}", e);
    }
}

use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use crate::core::{AppConfig, ImageFormat, VIDEO_EXTENSIONS};
use crate::gui::state::{Effect, FormEvent, FormState, NoticeKind};
use crate::video::{probe_for, ExtractionJob, FfmpegTool, FrameRateProbe, JobEvent, JobHandle};

/// How long closing the window waits for a cancelled job to kill FFmpeg.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct ExtractorApp {
    pub config: AppConfig,
    /// Where picks and last-used form values are persisted; `None` keeps them in memory
    pub config_path: Option<PathBuf>,
    pub tool: FfmpegTool,
    pub probe: Arc<dyn FrameRateProbe>,
    pub state: FormState,
    pub job: Option<JobHandle>,
    pub job_events: Option<mpsc::UnboundedReceiver<JobEvent>>,
}

impl ExtractorApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let config = AppConfig::load()?;
        let mut app = Self::with_config(config);
        app.config_path = Some(AppConfig::config_path());
        Ok(app)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let tool = FfmpegTool::from_config(&config);
        let probe: Arc<dyn FrameRateProbe> = Arc::from(probe_for(&config, &tool));
        log::info!("Using {} with {:?} frame rate probe", tool.ffmpeg.display(), config.probe_strategy);

        Self {
            state: FormState::from_config(&config),
            config,
            config_path: None,
            tool,
            probe,
            job: None,
            job_events: None,
        }
    }

    /// Routes one event through the form state and carries out the resulting effect.
    pub fn dispatch(&mut self, event: FormEvent) {
        match &event {
            FormEvent::VideoPicked(path) => {
                self.config.last_video_directory = path.parent().map(|p| p.to_path_buf());
                self.save_config();
            }
            FormEvent::OutputPicked(path) => {
                self.config.last_output_directory = Some(path.clone());
                self.save_config();
            }
            _ => {}
        }

        let effect = self.state.handle(event);
        self.apply(effect);
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Start(request) => {
                log::info!(
                    "Extracting {} into {} as {}",
                    request.video_path.display(),
                    request.output_dir.display(),
                    request.format
                );

                self.config.default_format = self.state.format;
                self.config.default_rate = self.state.rate_text.clone();
                self.config.use_native_rate = self.state.native_rate;
                self.save_config();

                let (handle, events) = ExtractionJob::new(&self.tool, self.probe.clone(), request).start();
                self.job = Some(handle);
                self.job_events = Some(events);
            }
            Effect::Cancel => {
                if let Some(job) = &self.job {
                    job.cancel();
                }
            }
        }
    }

    /// Drains pending job events without blocking.
    pub fn poll_job(&mut self) {
        let mut pending = Vec::new();
        let mut finished = false;

        if let Some(receiver) = self.job_events.as_mut() {
            loop {
                match receiver.try_recv() {
                    Ok(event) => {
                        finished |= event.is_terminal();
                        pending.push(event);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if !finished {
                            log::error!("Extraction worker exited without reporting a result");
                            pending.push(JobEvent::Failed(
                                "extraction worker stopped unexpectedly".to_string(),
                            ));
                            finished = true;
                        }
                        break;
                    }
                }
            }
        }

        for event in pending {
            self.dispatch(FormEvent::Job(event));
        }

        if finished {
            self.job = None;
            self.job_events = None;
        }
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            log::warn!("Failed to save config: {}", e);
        }
    }

    fn pick_video(&self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().add_filter("Video Files", &VIDEO_EXTENSIONS[..]);
        if let Some(dir) = &self.config.last_video_directory {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_file()
    }

    fn pick_output_folder(&self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new();
        if let Some(dir) = &self.config.last_output_directory {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_folder()
    }

    fn show_form(&mut self, ui: &mut egui::Ui, events: &mut Vec<FormEvent>) {
        let running = self.state.is_running();

        egui::Grid::new("extraction_form")
            .num_columns(3)
            .spacing([8.0, 8.0])
            .show(ui, |ui| {
                ui.label("Select Video File:");
                ui.add_enabled(!running, egui::TextEdit::singleline(&mut self.state.video_path).desired_width(350.0));
                if ui.add_enabled(!running, egui::Button::new("📁 Browse")).clicked() {
                    if let Some(path) = self.pick_video() {
                        events.push(FormEvent::VideoPicked(path));
                    }
                }
                ui.end_row();

                ui.label("Select Output Folder:");
                ui.add_enabled(!running, egui::TextEdit::singleline(&mut self.state.output_dir).desired_width(350.0));
                if ui.add_enabled(!running, egui::Button::new("📁 Browse")).clicked() {
                    if let Some(path) = self.pick_output_folder() {
                        events.push(FormEvent::OutputPicked(path));
                    }
                }
                ui.end_row();

                ui.label("Frame Interval (fps):");
                ui.add_enabled(
                    !running && !self.state.native_rate,
                    egui::TextEdit::singleline(&mut self.state.rate_text).desired_width(50.0),
                );
                ui.add_enabled(!running, egui::Checkbox::new(&mut self.state.native_rate, "Use Original Frame Rate"));
                ui.end_row();

                ui.label("Frame Format:");
                ui.add_enabled_ui(!running, |ui| {
                    egui::ComboBox::from_id_source("image_format")
                        .selected_text(self.state.format.to_string())
                        .show_ui(ui, |ui| {
                            for format in ImageFormat::ALL {
                                ui.selectable_value(&mut self.state.format, format, format.to_string());
                            }
                        });
                });
                ui.end_row();
            });

        ui.add_space(16.0);

        ui.horizontal(|ui| {
            if ui.add_enabled(!running, egui::Button::new("✂ Extract Frames").min_size(egui::vec2(160.0, 0.0))).clicked() {
                events.push(FormEvent::ExtractClicked);
            }
            if ui.add_enabled(running, egui::Button::new("⏹ Cancel")).clicked() {
                events.push(FormEvent::CancelClicked);
            }
        });

        ui.add_space(12.0);

        let progress = &self.state.progress;
        ui.add(
            egui::ProgressBar::new(progress.fraction())
                .text(format!("{} lines of FFmpeg output", progress.lines()))
                .animate(running),
        );
    }

    fn show_notice(&self, ctx: &egui::Context, events: &mut Vec<FormEvent>) {
        let Some(notice) = self.state.current_notice() else {
            return;
        };

        let color = match notice.kind() {
            NoticeKind::Info => egui::Color32::LIGHT_BLUE,
            NoticeKind::Warning => egui::Color32::YELLOW,
            NoticeKind::Error => egui::Color32::LIGHT_RED,
        };

        egui::Window::new(notice.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.colored_label(color, notice.message());
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        events.push(FormEvent::NoticeDismissed);
                    }
                });
            });
    }
}

impl eframe::App for ExtractorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_job();

        let mut events = Vec::new();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Status:");
                if self.state.is_running() {
                    match self.state.probed_rate {
                        Some(rate) => ui.label(format!("Extracting ({})", rate)),
                        None => ui.label("Probing video..."),
                    };
                } else {
                    ui.label("Ready");
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Frame Extractor");
            ui.separator();
            self.show_form(ui, &mut events);
        });

        self.show_notice(ctx, &mut events);

        for event in events {
            self.dispatch(event);
        }

        if self.state.is_running() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}

impl Drop for ExtractorApp {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            if !job.cancel_and_wait(SHUTDOWN_GRACE) {
                log::warn!("Extraction worker still running at shutdown");
            }
        }
    }
}

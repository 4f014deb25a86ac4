#[cfg(test)]
mod tests {

    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use crate::core::{AppConfig, ImageFormat, SamplingRate};
    use crate::gui::app::ExtractorApp;
    use crate::gui::state::{Effect, FormEvent, FormState, Notice, NoticeKind, Phase, Progress};
    use crate::video::{FrameRate, FrameRateProbe, JobEvent};

    struct ZeroProbe;

    impl FrameRateProbe for ZeroProbe {
        fn probe(&self, _video: &Path) -> FrameRate {
            FrameRate::ZERO
        }
    }

    struct PanickingRateReader;

    impl FrameRateProbe for PanickingRateReader {
        fn probe(&self, _video: &Path) -> FrameRate {
            panic!("rate reader blew up");
        }
    }

    fn filled_form() -> FormState {
        let mut state = FormState::from_config(&AppConfig::default());
        state.video_path = "/videos/clip.mp4".to_string();
        state.output_dir = "/frames".to_string();
        state
    }

    // Test helper to create an app that never touches the user's config file
    fn create_test_app() -> ExtractorApp {
        let mut app = ExtractorApp::with_config(AppConfig::default());
        app.probe = Arc::new(ZeroProbe);
        app
    }

    #[test]
    fn test_form_defaults_from_config() {
        let mut config = AppConfig::default();
        config.default_format = ImageFormat::Jpg;
        config.use_native_rate = true;

        let state = FormState::from_config(&config);
        assert_eq!(state.rate_text, "1");
        assert_eq!(state.format, ImageFormat::Jpg);
        assert!(state.native_rate);
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.current_notice().is_none());
    }

    #[test]
    fn test_empty_output_path_warns_and_does_nothing() {
        let mut state = filled_form();
        state.output_dir = String::new();

        assert_eq!(state.handle(FormEvent::ExtractClicked), Effect::None);
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.current_notice(), Some(&Notice::MissingInput));
        assert_eq!(Notice::MissingInput.kind(), NoticeKind::Warning);
    }

    #[test]
    fn test_empty_video_path_warns_and_does_nothing() {
        let mut state = filled_form();
        state.video_path = "   ".to_string();

        assert_eq!(state.handle(FormEvent::ExtractClicked), Effect::None);
        assert_eq!(state.current_notice(), Some(&Notice::MissingInput));
    }

    #[test]
    fn test_invalid_rate_warns() {
        let mut state = filled_form();
        state.rate_text = "fast".to_string();

        assert_eq!(state.handle(FormEvent::ExtractClicked), Effect::None);
        assert_eq!(state.current_notice(), Some(&Notice::InvalidRate("fast".to_string())));

        // Native mode ignores the rate field entirely
        state.handle(FormEvent::NoticeDismissed);
        state.native_rate = true;
        assert!(matches!(state.handle(FormEvent::ExtractClicked), Effect::Start(_)));
    }

    #[test]
    fn test_extract_starts_job_and_resets_progress() {
        let mut state = filled_form();
        state.rate_text = "2".to_string();
        state.progress.advance();

        let effect = state.handle(FormEvent::ExtractClicked);
        match effect {
            Effect::Start(request) => {
                assert_eq!(request.video_path, PathBuf::from("/videos/clip.mp4"));
                assert_eq!(request.output_dir, PathBuf::from("/frames"));
                assert_eq!(request.format, ImageFormat::Png);
                assert_eq!(request.rate, SamplingRate::PerSecond(2.0));
            }
            other => panic!("Unexpected effect: {:?}", other),
        }
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(state.progress.lines(), 0);

        // A second click while running is ignored
        assert_eq!(state.handle(FormEvent::ExtractClicked), Effect::None);
    }

    #[test]
    fn test_job_lifecycle_events() {
        let mut state = filled_form();
        state.handle(FormEvent::ExtractClicked);

        state.handle(FormEvent::Job(JobEvent::Probed(FrameRate(25.0))));
        assert_eq!(state.probed_rate, Some(FrameRate(25.0)));

        state.handle(FormEvent::Job(JobEvent::Started));
        assert_eq!(state.current_notice(), Some(&Notice::Started));

        for line in ["Input #0", "Stream #0:0", "frame=  10"] {
            state.handle(FormEvent::Job(JobEvent::Line(line.to_string())));
        }
        assert_eq!(state.progress.lines(), 3);

        // Exit status does not matter
        state.handle(FormEvent::Job(JobEvent::Finished { exit_code: Some(1) }));
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.notices.iter().collect::<Vec<_>>(), vec![&Notice::Started, &Notice::Success]);

        state.handle(FormEvent::NoticeDismissed);
        assert_eq!(state.current_notice(), Some(&Notice::Success));
    }

    #[test]
    fn test_unread_start_notice_is_kept_when_job_ends() {
        let mut state = filled_form();
        state.handle(FormEvent::ExtractClicked);
        state.handle(FormEvent::Job(JobEvent::Started));
        state.handle(FormEvent::Job(JobEvent::Failed("broken pipe".to_string())));

        assert_eq!(state.current_notice(), Some(&Notice::Started));
        state.handle(FormEvent::NoticeDismissed);
        assert_eq!(state.current_notice(), Some(&Notice::Failed("broken pipe".to_string())));
        state.handle(FormEvent::NoticeDismissed);
        assert!(state.current_notice().is_none());
    }

    #[test]
    fn test_frame_rate_unavailable_is_an_error() {
        let mut state = filled_form();
        state.handle(FormEvent::ExtractClicked);
        state.handle(FormEvent::Job(JobEvent::FrameRateUnavailable));

        let notice = state.current_notice().expect("notice expected");
        assert_eq!(notice.kind(), NoticeKind::Error);
        assert_eq!(notice.message(), "Could not determine frame rate.");
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_failure_notice_is_generic() {
        let mut state = filled_form();
        state.handle(FormEvent::ExtractClicked);
        state.handle(FormEvent::Job(JobEvent::Failed("Failed to launch ffmpeg: not found".to_string())));

        let notice = state.current_notice().expect("notice expected");
        assert_eq!(notice.title(), "Error");
        assert!(notice.message().starts_with("Failed to extract frames:"));
    }

    #[test]
    fn test_cancel_only_while_running() {
        let mut state = filled_form();
        assert_eq!(state.handle(FormEvent::CancelClicked), Effect::None);

        state.handle(FormEvent::ExtractClicked);
        assert_eq!(state.handle(FormEvent::CancelClicked), Effect::Cancel);

        state.handle(FormEvent::Job(JobEvent::Cancelled));
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.current_notice(), Some(&Notice::Cancelled));
    }

    #[test]
    fn test_notices_queue_in_order() {
        let mut state = filled_form();
        state.output_dir.clear();
        state.handle(FormEvent::ExtractClicked);
        state.handle(FormEvent::ExtractClicked);
        assert_eq!(state.notices.len(), 2);

        state.handle(FormEvent::NoticeDismissed);
        assert_eq!(state.notices.len(), 1);
        state.handle(FormEvent::NoticeDismissed);
        assert!(state.current_notice().is_none());

        // Dismissing with nothing queued is harmless
        state.handle(FormEvent::NoticeDismissed);
    }

    #[test]
    fn test_pickers_fill_fields() {
        let mut state = FormState::from_config(&AppConfig::default());
        state.handle(FormEvent::VideoPicked(PathBuf::from("/videos/a.mkv")));
        state.handle(FormEvent::OutputPicked(PathBuf::from("/frames/a")));
        assert_eq!(state.video_path, "/videos/a.mkv");
        assert_eq!(state.output_dir, "/frames/a");
    }

    #[test]
    fn test_progress_is_an_uncalibrated_counter() {
        let mut progress = Progress::new(4);
        assert_eq!(progress.fraction(), 0.0);
        progress.advance();
        assert_eq!(progress.fraction(), 0.25);
        for _ in 0..10 {
            progress.advance();
        }
        assert_eq!(progress.lines(), 11);
        assert_eq!(progress.fraction(), 1.0);

        progress.reset();
        assert_eq!(progress.lines(), 0);

        // Zero scale is clamped
        assert_eq!(Progress::new(0).fraction(), 0.0);
    }

    #[test]
    fn test_app_missing_output_starts_no_job() {
        let mut app = create_test_app();
        app.state.video_path = "/videos/clip.mp4".to_string();

        app.dispatch(FormEvent::ExtractClicked);
        assert!(app.job.is_none());
        assert!(app.job_events.is_none());
        assert_eq!(app.state.current_notice(), Some(&Notice::MissingInput));
    }

    #[test]
    fn test_app_zero_frame_rate_aborts_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = create_test_app();
        app.state.video_path = "/videos/clip.mp4".to_string();
        app.state.output_dir = dir.path().join("frames").display().to_string();

        app.dispatch(FormEvent::ExtractClicked);
        assert!(app.job.is_some());

        let deadline = Instant::now() + Duration::from_secs(10);
        while app.state.is_running() {
            assert!(Instant::now() < deadline, "job never finished");
            app.poll_job();
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(app.job.is_none());
        assert_eq!(app.state.notices.iter().collect::<Vec<_>>(), vec![&Notice::FrameRateUnavailable]);
        assert_eq!(app.state.progress.lines(), 0);
    }

    #[test]
    fn test_app_recovers_when_worker_dies() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = create_test_app();
        app.probe = Arc::new(PanickingRateReader);
        app.state.video_path = "/videos/clip.mp4".to_string();
        app.state.output_dir = dir.path().join("frames").display().to_string();

        app.dispatch(FormEvent::ExtractClicked);
        assert!(app.job.is_some());

        let deadline = Instant::now() + Duration::from_secs(10);
        while app.state.is_running() {
            assert!(Instant::now() < deadline, "form stuck in running state");
            app.poll_job();
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(app.job.is_none());
        assert!(app.job_events.is_none());
        let notice = app.state.current_notice().expect("notice expected");
        assert_eq!(notice, &Notice::Failed("extraction worker stopped unexpectedly".to_string()));
        assert_eq!(notice.kind(), NoticeKind::Error);

        // The form accepts a new extraction afterwards
        app.probe = Arc::new(ZeroProbe);
        app.dispatch(FormEvent::ExtractClicked);
        assert!(app.job.is_some());
    }

    #[test]
    fn test_app_remembers_last_used_values() {
        let mut app = create_test_app();
        app.dispatch(FormEvent::VideoPicked(PathBuf::from("/videos/clip.mp4")));
        assert_eq!(app.config.last_video_directory, Some(PathBuf::from("/videos")));

        app.dispatch(FormEvent::OutputPicked(PathBuf::from("/frames")));
        assert_eq!(app.config.last_output_directory, Some(PathBuf::from("/frames")));
        assert!(app.config_path.is_none());
    }
}

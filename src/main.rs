mod core;
mod gui;
mod video;

use eframe::egui;
use gui::ExtractorApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([620.0, 340.0])
            .with_title("Frame Extractor"),
        ..Default::default()
    };

    eframe::run_native(
        "Frame Extractor",
        options,
        Box::new(|cc| {
            match ExtractorApp::new(cc) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}

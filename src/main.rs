use std::sync::Arc;

use anyhow::Context;
use eframe::egui;

use workout_tracker::app::configure_style;
use workout_tracker::{AppConfig, HttpBackend, Session, TokenStore, WorkoutApp};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let session = Session::open(TokenStore::new(config.resolved_token_path()));
    let backend = HttpBackend::new(&config, session.clone())
        .context("failed to set up the backend client")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Workout Tracker")
            .with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Workout Tracker",
        options,
        Box::new(move |cc| {
            configure_style(&cc.egui_ctx);
            Ok(Box::new(WorkoutApp::new(cc, &config, session, Arc::new(backend))))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch workout tracker: {err}"))
}

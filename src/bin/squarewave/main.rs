//! squarewave - a square-wave voice through a reverb, with a wet-level slider
//!
//! Run with: cargo run --bin squarewave
//! Logs are written to squarewave.log (filter with RUST_LOG).

mod app;
mod ui;

use std::{fs::File, sync::Mutex};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::AudioApp;
use ui::SliderApp;

const LOG_FILE: &str = "squarewave.log";

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let mut audio = AudioApp::start().wrap_err("failed to start audio")?;
    audio.play_middle_c()?;

    let mut app = SliderApp::new(audio)?;
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();

    tracing::info!("shutting down");
    result
}

fn init_logging() -> EyreResult<()> {
    let file = File::create(LOG_FILE).wrap_err_with(|| format!("failed to create {}", LOG_FILE))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

//! Chapter composition binary.
//!
//! Usage: `reel-compose <chapter-dir> [settings.json]`
//!
//! The optional settings file is a partial JSON document merged with the
//! built-in defaults. Ctrl-C requests cooperative cancellation; in-flight
//! segment encodes finish or fail and their temp files are removed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_compose::VideoComposer;
use reel_models::VideoSettings;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut args = std::env::args().skip(1);
    let chapter_path = match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("usage: reel-compose <chapter-dir> [settings.json]");
            std::process::exit(2);
        }
    };

    let settings = match load_settings(args.next()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings: {e}");
            std::process::exit(2);
        }
    };

    let composer = match VideoComposer::new(settings) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Invalid settings: {e}");
            std::process::exit(2);
        }
    };

    // Ctrl-C requests cancellation; the job itself decides when to stop
    let cancel_target = Arc::clone(&composer);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, cancelling job");
            cancel_target.cancel();
        }
    });

    // Periodic progress logging while the job runs
    let progress_source = Arc::clone(&composer);
    let reporter = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            let snap = progress_source.progress();
            info!(
                status = ?snap.status,
                progress = snap.progress,
                total = snap.total,
                percentage = snap.percentage,
                task = %snap.current_task,
                "progress"
            );
            if snap.status.is_terminal() {
                break;
            }
        }
    });

    let result = composer.generate_video(&chapter_path).await;
    reporter.abort();

    match result {
        Ok(path) => {
            info!(output = %path.display(), "done");
        }
        Err(e) if e.is_cancelled() => {
            info!("job cancelled");
            std::process::exit(130);
        }
        Err(e) => {
            error!("composition failed: {e}");
            std::process::exit(1);
        }
    }
}

fn load_settings(path: Option<String>) -> anyhow::Result<VideoSettings> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            Ok(VideoSettings::from_overrides(&json)?)
        }
        None => Ok(VideoSettings::default()),
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reel=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

// Freight Admin
// Library entry point: logging setup and the terminal front end.

pub mod api;
pub mod config;
pub mod forms;
pub mod listing;
pub mod models;
pub mod notify;
pub mod security;
mod tui;
pub mod utils;

use log::{error, info};

use crate::config::{AppConfig, LoggingSettings};

/// Initialize logging system with dual format (JSON + human-readable)
pub fn init_logging(settings: &LoggingSettings, tui_mode: bool) -> anyhow::Result<()> {
    let log_dir = utils::path_resolver::resolve_log_folder()?;
    utils::path_resolver::ensure_dir(&log_dir)?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%d-%H%M%S");
    let json_log_file = log_dir.join(format!("freight-admin-{}.log", timestamp));
    let txt_log_file = log_dir.join(format!("freight-admin-{}.txt", timestamp));

    let level = settings.level.parse().unwrap_or(log::LevelFilter::Info);
    let mut dispatch = fern::Dispatch::new()
        .level(level)
        // Connection pool chatter drowns out our own lines.
        .level_for("hyper", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn);

    // Stdout would corrupt the alternate screen, so the TUI logs to files only.
    if settings.stdout && !tui_mode {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    out.finish(format_args!(
                        "{}",
                        human_line(&timestamp_local.to_string(), record, &message.to_string())
                    ));
                })
                .chain(std::io::stdout()),
        );
    }

    dispatch = dispatch
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    let message_str = message.to_string();
                    let (phase, step, cleaned) = utils::logging::parse_log_metadata(&message_str);
                    let json_line = utils::logging::format_json_log(
                        &chrono::Utc::now().to_rfc3339(),
                        record.level(),
                        record.target(),
                        &cleaned,
                        phase.as_deref(),
                        step.as_deref(),
                    );
                    out.finish(format_args!("{}\n", json_line));
                })
                .chain(fern::log_file(json_log_file)?),
        )
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    let timestamp_local = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                    out.finish(format_args!(
                        "{}\n",
                        human_line(&timestamp_local.to_string(), record, &message.to_string())
                    ));
                })
                .chain(fern::log_file(txt_log_file)?),
        );

    dispatch.apply()?;

    info!(
        "[PHASE: initialization] Logging initialized, log directory: {:?}",
        log_dir
    );
    Ok(())
}

fn human_line(timestamp: &str, record: &log::Record<'_>, message: &str) -> String {
    let (phase, step, cleaned) = utils::logging::parse_log_metadata(message);
    utils::logging::format_human_readable_log(
        timestamp,
        record.level(),
        record.target(),
        &cleaned,
        phase.as_deref(),
        step.as_deref(),
    )
}

/// Interactive terminal front end.
pub fn run_tui(config: &AppConfig) -> anyhow::Result<()> {
    if let Err(e) = init_logging(&config.logging, true) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!(
        "[PHASE: initialization] Freight admin TUI starting at {} (api={})",
        chrono::Utc::now(),
        config.api.base_url
    );

    tui::run(config).map_err(|e| {
        error!("[PHASE: tui] [STEP: fatal] TUI exited with error: {:?}", e);
        e
    })
}

/// Non-interactive TUI smoke mode (for automated checks).
/// Renders a single frame into an in-memory backend and exits.
pub fn run_tui_smoke(config: &AppConfig, target: Option<String>) -> anyhow::Result<()> {
    if let Err(e) = init_logging(&config.logging, true) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let target = target.as_deref().unwrap_or("dashboard");
    tui::smoke(target).map_err(|e| {
        error!(
            "[PHASE: tui] [STEP: smoke] TUI smoke exited with error: {:?}",
            e
        );
        e
    })
}

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::Level;

use linkpeek::config::{TriggerConfig, TriggerMode};
use linkpeek::persist::GeometryStore;
use linkpeek::search::SearchSettings;
use linkpeek::sim::{self, SimOptions};
use linkpeek::theme::ThemePref;

/// Terminal simulator for the linkpeek preview-window engine.
#[derive(Parser)]
#[command(name = "linkpeek", version, about)]
struct Cli {
    /// Trigger mode: drag_link, hover, alt_hover, alt_click, long_press,
    /// disabled
    #[arg(long, default_value = "hover")]
    mode: String,

    /// Hover trigger delay in milliseconds (clamped to 200..=10000)
    #[arg(long)]
    hover_delay: Option<u64>,

    /// Modifier-hover trigger delay in milliseconds
    #[arg(long)]
    alt_hover_delay: Option<u64>,

    /// Long-press trigger delay in milliseconds
    #[arg(long)]
    long_press_delay: Option<u64>,

    /// Chrome theme: light or dark
    #[arg(long, default_value = "dark")]
    theme: String,

    /// Overlay opacity percentage (0..=100)
    #[arg(long, default_value_t = 50)]
    overlay_opacity: u8,

    /// Blacklist pattern, repeatable (exact, `.suffix`, `*.suffix`, or
    /// substring)
    #[arg(long = "blacklist")]
    blacklist: Vec<String>,

    /// File for the remembered last-used geometry
    #[arg(long)]
    store: Option<PathBuf>,

    /// Replay a JSON-lines InputEvent script and print effects instead of
    /// running the interactive simulator
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Append debug logs to this file (the TUI owns the terminal, so logs
    /// can't go to stderr)
    #[arg(long)]
    log: Option<PathBuf>,
}

fn parse_mode(value: &str) -> Option<TriggerMode> {
    match value {
        "drag_link" => Some(TriggerMode::DragLink),
        "hover" => Some(TriggerMode::Hover),
        "alt_hover" => Some(TriggerMode::AltHover),
        "alt_click" => Some(TriggerMode::AltClick),
        "long_press" => Some(TriggerMode::LongPress),
        "disabled" => Some(TriggerMode::Disabled),
        _ => None,
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let Some(trigger_mode) = parse_mode(&cli.mode) else {
        return Err(io::Error::other(format!("unknown trigger mode: {}", cli.mode)));
    };
    let preview_theme = match cli.theme.as_str() {
        "light" => ThemePref::Light,
        "dark" => ThemePref::Dark,
        other => return Err(io::Error::other(format!("unknown theme: {other}"))),
    };

    let defaults = TriggerConfig::default();
    let config = TriggerConfig {
        trigger_mode,
        hover_delay: cli.hover_delay.unwrap_or(defaults.hover_delay),
        alt_hover_delay: cli.alt_hover_delay.unwrap_or(defaults.alt_hover_delay),
        long_press_delay: cli.long_press_delay.unwrap_or(defaults.long_press_delay),
        preview_theme,
        overlay_opacity: cli.overlay_opacity,
        blacklist_sites: cli.blacklist,
        ..defaults
    }
    .sanitized();

    let options = SimOptions {
        config,
        search: SearchSettings::default(),
        store: cli.store.map(GeometryStore::new),
    };

    if let Some(script_path) = cli.replay {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .try_init();
        let script = fs::read_to_string(script_path)?;
        return sim::replay(&script, options).map_err(io::Error::other);
    }

    if let Some(log_path) = cli.log {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .try_init();
    }

    sim::run(options)
}

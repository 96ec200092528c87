#![forbid(unsafe_code)]

mod gui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

use touch_layout::config::{EditorConfig, JsonFilePreferences, PreferencesStore, SettingsStore};
use touch_layout::geometry::{Insets, Rect};
use touch_layout::layout::LayoutResolver;
use touch_layout::layout::controller::ControllerLayout;
use touch_layout::persistence::BackgroundStore;
use touch_layout::types::{ControllerId, LayoutKey, Orientation};

#[derive(Parser)]
#[command(name = "touch-layout")]
#[command(about = "Edit and inspect on-screen controller layouts")]
struct Cli {
    /// Editor config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Persisted touch settings file
    #[arg(long, global = true)]
    preferences: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the desktop layout editor
    Edit {
        /// Built-in controller (`demo` or `gba`)
        #[arg(long, default_value = "demo")]
        controller: String,
    },
    /// Print resolved placements as JSON
    Show {
        /// Built-in controller (`demo` or `gba`)
        #[arg(long, default_value = "demo")]
        controller: String,
        #[arg(long, value_enum, default_value_t = OrientationArg::Landscape)]
        orientation: OrientationArg,
        #[arg(long, default_value_t = 1280.0)]
        width: f32,
        #[arg(long, default_value_t = 720.0)]
        height: f32,
    },
    /// Revert a stored layout to defaults
    Reset {
        /// Built-in controller (`demo` or `gba`)
        #[arg(long, default_value = "demo")]
        controller: String,
        #[arg(long, value_enum, default_value_t = OrientationArg::Landscape)]
        orientation: OrientationArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

/// `LOG_LEVEL` wins over the config file
fn resolve_level(env: Option<String>, configured: &str) -> TraceLevel {
    parse_level(env.as_deref().unwrap_or(configured))
}

/// Load the editor config under a temporary subscriber, since the global
/// one needs the config's log level and does not exist yet.
fn load_config<W>(path: Option<&Path>, level: TraceLevel, make_writer: W) -> Result<EditorConfig>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::with_default(bootstrap, || match path {
        Some(path) => EditorConfig::load_from(path),
        None => EditorConfig::load(),
    })
}

fn settings_store(cli: &Cli) -> PreferencesStore<JsonFilePreferences> {
    let path = cli
        .preferences
        .clone()
        .unwrap_or_else(JsonFilePreferences::default_path);
    PreferencesStore::new(JsonFilePreferences::new(path))
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let env_level = std::env::var("LOG_LEVEL").ok();
    let config = load_config(
        cli.config.as_deref(),
        resolve_level(env_level.clone(), "info"),
        std::io::stdout,
    )?;

    let log_level = resolve_level(env_level, &config.log_level);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let command = cli.command.take().unwrap_or(Commands::Edit {
        controller: "demo".to_string(),
    });

    match command {
        Commands::Edit { controller } => {
            let store = BackgroundStore::spawn(Arc::new(settings_store(&cli)))?;
            gui::run_editor(config, Arc::new(store), ControllerId::new(controller))
        }
        Commands::Show {
            controller,
            orientation,
            width,
            height,
        } => {
            let layout = ControllerLayout::builtin(ControllerId::new(controller));
            let key = LayoutKey::new(layout.id.clone(), orientation.into());
            let settings = settings_store(&cli).retrieve(&key, &layout.element_ids())?;

            let resolver = LayoutResolver::new(config.layout);
            let placements = resolver.resolve(
                &layout,
                &settings,
                key.orientation,
                Rect::new(0.0, 0.0, width, height),
                Insets::default(),
            );
            let json = serde_json::to_string_pretty(&placements)
                .context("Failed to serialize placements")?;
            println!("{json}");
            Ok(())
        }
        Commands::Reset {
            controller,
            orientation,
        } => {
            let layout = ControllerLayout::builtin(ControllerId::new(controller));
            let key = LayoutKey::new(layout.id.clone(), orientation.into());
            let store = settings_store(&cli);
            let settings = store.retrieve(&key, &layout.element_ids())?;
            store.store(&key, &settings.reset())?;
            info!(layout = %key, "Reset stored layout");
            Ok(())
        }
    }
}

//! COM Port Monitor
//!
//! A background process that reports serial ports as they are plugged in
//! and unplugged, distinguishing newly discovered devices from the ones
//! already attached at startup.

mod cli;
mod presenter;
mod settings;
mod watch;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use settings::Settings;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "comwatch={level},com_detect={level},com_registry={level}",
                    level = default_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut settings = Settings::load();
    cli.apply_overrides(&mut settings);

    if cli.save_settings {
        match settings.save() {
            Ok(path) => tracing::info!("Saved settings to {}", path.display()),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    match cli.command() {
        Command::List { json } => watch::list(&settings, json),
        Command::Watch { .. } => {
            tracing::info!("Starting COM port monitor");
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start runtime")?;
            runtime.block_on(watch::run(&settings))
        }
    }
}

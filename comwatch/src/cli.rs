//! Command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::Settings;

/// Watch serial ports come and go
#[derive(Debug, Parser)]
#[command(name = "comwatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet time after a device node event before reconciling, in ms
    #[arg(long, global = true)]
    pub settle_ms: Option<u64>,

    /// How long a discovered port is marked NEW, in seconds
    #[arg(long, global = true)]
    pub new_window_secs: Option<u64>,

    /// Device directory to watch (repeatable; replaces the configured list)
    #[arg(long = "watch-path", global = true)]
    pub watch_paths: Vec<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long, global = true)]
    pub save_settings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Monitor ports until interrupted (default)
    Watch {
        /// Print the port list after every change
        #[arg(long)]
        show_list: bool,
    },
    /// Print the attached ports once and exit
    List {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Subcommand to run
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Watch { show_list: false })
    }

    /// Apply command line overrides on top of loaded settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(ms) = self.settle_ms {
            settings.settle_ms = ms;
        }
        if let Some(secs) = self.new_window_secs {
            settings.new_window_secs = secs;
        }
        if !self.watch_paths.is_empty() {
            settings.watch_paths = self.watch_paths.clone();
        }
        if let Some(Command::Watch { show_list: true }) = self.command {
            settings.show_list_on_change = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_watch() {
        let cli = Cli::parse_from(["comwatch"]);
        assert_eq!(cli.command(), Command::Watch { show_list: false });
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "comwatch",
            "watch",
            "--show-list",
            "--settle-ms",
            "50",
            "--watch-path",
            "/dev",
            "--watch-path",
            "/dev/serial",
        ]);

        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);

        assert_eq!(settings.settle_ms, 50);
        assert_eq!(settings.new_window_secs, 300);
        assert_eq!(
            settings.watch_paths,
            vec![PathBuf::from("/dev"), PathBuf::from("/dev/serial")]
        );
        assert!(settings.show_list_on_change);
    }

    #[test]
    fn test_list_json() {
        let cli = Cli::parse_from(["comwatch", "--verbose", "list", "--json"]);
        assert!(cli.verbose);
        assert_eq!(cli.command(), Command::List { json: true });
    }
}

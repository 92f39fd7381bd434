//! Command-line entry point.

#![allow(clippy::print_stdout, clippy::print_stderr, reason = "the CLI reports to the terminal")]

use crate::config::SwitcherConfig;
use crate::error::LayoutError;
use crate::platform::NativeDesktop;
use crate::switcher::{ApplyEvent, Switcher};
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "windowlayout", version)]
#[command(about = "Save and restore the on-screen layout of application windows")]
pub struct Cli {
    /// Path to layout file to use
    #[arg(short = 'f', long = "layout-file", value_name = "FILE", global = true)]
    layout_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read the current layout and save it to the layout file
    Save {
        /// Name of layout to save as
        #[arg(value_name = "LAYOUT")]
        layout_name: Option<String>,
    },
    /// Apply a saved layout
    Apply {
        /// Name of layout to apply
        #[arg(value_name = "LAYOUT")]
        layout_name: Option<String>,
    },
}

/// Parse `args` and run the command, returning the process exit code.
pub fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match dispatch(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), LayoutError> {
    let config = SwitcherConfig::resolve(cli.layout_file.as_deref())?;

    match cli.command {
        Commands::Save { layout_name } => {
            let desktop = NativeDesktop::new();
            let outcome = Switcher::new(config, &desktop).capture(layout_name.as_deref())?;
            println!("Saving layout {} to {}", outcome.layout_name, outcome.path.display());
        }
        Commands::Apply { layout_name } => {
            let name = layout_name.unwrap_or_else(|| config.default_layout.clone());
            let desktop = NativeDesktop::new();
            Switcher::new(config, &desktop).apply_with(&name, &mut print_event)?;
        }
    }
    Ok(())
}

fn print_event(event: ApplyEvent<'_>) {
    match event {
        ApplyEvent::Starting { command, .. } => println!("Starting {command}"),
        ApplyEvent::NoWindow { program } => eprintln!("Unable to create window for {program}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_layout_file_after_subcommand() {
        let cli =
            Cli::try_parse_from(["windowlayout", "apply", "work", "-f", "/tmp/l.json"]).unwrap();
        assert_eq!(cli.layout_file, Some(PathBuf::from("/tmp/l.json")));
        assert!(matches!(cli.command, Commands::Apply { layout_name: Some(ref n) } if n == "work"));
    }

    #[test]
    fn test_save_name_is_optional() {
        let cli =
            Cli::try_parse_from(["windowlayout", "--layout-file", "/tmp/l.json", "save"]).unwrap();
        assert!(matches!(cli.command, Commands::Save { layout_name: None }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["windowlayout"]).is_err());
    }
}

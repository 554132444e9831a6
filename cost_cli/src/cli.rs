//! Command-line structure of `sectio`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Sectio - indirect cost allocation by homogeneous sections
///
/// Loads a project file, checks its allocation keys and prints the unit
/// cost of every primary section and product.
#[derive(Parser, Debug)]
#[command(name = "sectio")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format (defaults to the config file's, then table)
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Accepted gap between a key's sum and 100, in percentage points (0 to 1)
    #[arg(long, global = true)]
    pub tolerance: Option<f64>,

    /// Treat sections missing from a key as errors
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Three sections, fixed charges only
    Tutorial,
    /// Two workshops, two auxiliary sections, fixed and variable charges
    #[default]
    Workshop,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a project and compute its unit costs
    Calc {
        /// Project file (.sct or plain JSON)
        file: PathBuf,
    },

    /// Check a project without computing; exits non-zero on errors
    Validate {
        /// Project file (.sct or plain JSON)
        file: PathBuf,
    },

    /// Run a built-in example
    Demo {
        #[arg(short, long, value_enum, default_value_t = Scenario::Workshop)]
        scenario: Scenario,
    },

    /// Write a starting project based on the workshop example
    Init {
        /// Where to write the project
        file: PathBuf,

        /// Project name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sectio", "calc", "p.sct", "--strict", "--tolerance", "0.5", "-f", "json"]);
        assert!(cli.strict);
        assert_eq!(cli.tolerance, Some(0.5));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Calc { .. }));
    }

    #[test]
    fn test_demo_defaults_to_workshop() {
        let cli = Cli::parse_from(["sectio", "demo"]);
        match cli.command {
            Commands::Demo { scenario } => assert_eq!(scenario, Scenario::Workshop),
            other => panic!("unexpected command {:?}", other),
        }
    }
}

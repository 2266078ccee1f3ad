//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::TraversalOrder;

/// Aircraft sizing data tree: export, inspect and edit aircraft models
#[derive(Parser, Debug)]
#[command(name = "acsize")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory searched for a local acsize.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub work_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Child order for listings and exports.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderArg {
    Declaration,
    Alphabetical,
}

impl From<OrderArg> for TraversalOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Declaration => TraversalOrder::Declaration,
            OrderArg::Alphabetical => TraversalOrder::Alphabetical,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an aircraft as sectioned text
    Export {
        /// Aircraft file to re-export (default: a new aircraft)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        /// Output file (default: <output_dir>/<name>.ini)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Child order (default: from config)
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
        /// Write exact values instead of rendered ones
        #[arg(long)]
        raw: bool,
        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Print an aircraft as a tree
    Show {
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
    },

    /// List leaf paths
    Paths {
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
        /// Also print each value
        #[arg(short, long)]
        values: bool,
    },

    /// Print one leaf value
    Get {
        /// Leaf path, e.g. wing.area or wing/area
        path: String,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Change one leaf value in an aircraft file (written with exact values)
    Set {
        /// Leaf path, e.g. wing.area or wing/area
        path: String,
        /// New value (number, comma separated tuple, or text)
        value: String,
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output file (default: overwrite input)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Run the propulsion and high speed disciplines
    Run {
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        /// Output file (default: print changed values only)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show version, config locations and model size
    Info,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a commented config template
    Template,

    /// Show config paths
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_repeated_debug_flag_when_parsing_then_counts() {
        let cli = Cli::try_parse_from(["acsize", "-ddd", "info"]).unwrap();
        assert_eq!(cli.debug, 3);
        assert!(matches!(cli.command, Some(Commands::Info)));
    }

    #[test]
    fn given_set_without_input_when_parsing_then_rejected() {
        assert!(Cli::try_parse_from(["acsize", "set", "wing.area", "130"]).is_err());
    }

    #[test]
    fn given_export_with_order_when_parsing_then_maps_to_traversal_order() {
        let cli = Cli::try_parse_from(["acsize", "export", "--order", "alphabetical", "--raw", "--stdout"]).unwrap();
        match cli.command {
            Some(Commands::Export { order, raw, stdout, .. }) => {
                assert_eq!(order.map(TraversalOrder::from), Some(TraversalOrder::Alphabetical));
                assert!(raw && stdout);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

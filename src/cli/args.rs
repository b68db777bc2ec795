//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::CombatKind;

/// Army roster indexed by name, with dice-driven combat between its units
#[derive(Parser, Debug)]
#[command(name = "muster")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (repeat for more: -d -d -d)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Roster file (overrides config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub roster: Option<PathBuf>,

    /// Match unit names case-insensitively
    #[arg(short, long, global = true)]
    pub ignore_case: bool,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all units in name order
    List,

    /// Show one unit
    Show {
        /// Unit name
        name: String,
    },

    /// Show the roster index as a tree
    Tree {
        /// Verify ordering, balance and heights
        #[arg(long)]
        check: bool,
    },

    /// Let one unit attack another
    Fight {
        /// Attacking unit
        attacker: String,
        /// Defending unit
        defender: String,
        /// Attack kind: ranged, melee or psychic
        #[arg(short, long, default_value = "ranged")]
        kind: CombatKind,
        /// Maximum exchanges (default: max_rounds from config)
        #[arg(long)]
        rounds: Option<u32>,
        /// Dice seed for a reproducible fight
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Interactive session: pick attacker, defender and attack kind
    Play {
        /// Dice seed for reproducible rolls
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

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

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

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
    fn test_fight_defaults() {
        let cli = Cli::try_parse_from(["muster", "fight", "Titus", "Librarian"]).unwrap();
        match cli.command {
            Some(Commands::Fight {
                attacker,
                defender,
                kind,
                rounds,
                seed,
            }) => {
                assert_eq!(attacker, "Titus");
                assert_eq!(defender, "Librarian");
                assert_eq!(kind, CombatKind::Ranged);
                assert_eq!(rounds, None);
                assert_eq!(seed, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["muster", "list", "-d", "-d", "-i", "-r", "x.txt"]).unwrap();
        assert_eq!(cli.debug, 2);
        assert!(cli.ignore_case);
        assert_eq!(cli.roster, Some(PathBuf::from("x.txt")));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let res = Cli::try_parse_from(["muster", "fight", "A", "B", "--kind", "artillery"]);
        assert!(res.is_err());
    }
}

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use clap::Subcommand;
use serde::{Deserialize, Serialize};

pub mod controller;
pub mod document;
pub mod forms;
pub mod transport;
pub mod util;

pub use controller::ConfigController;

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Show the current configuration as per-channel forms
    Show {
        /// Emit the session as JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },
    /// Print the stored raw configuration text
    Raw {
        /// Print secret values instead of masking them
        #[arg(long)]
        reveal: bool,
    },
    /// Print the value at a configuration path
    #[command(long_about = "\
Print the value at a configuration path.

Paths are dot-separated; all-digit segments address sequence \
elements, everything else addresses mapping keys.

Examples:
  switchboard config get telegram.botToken
  switchboard config get discord.guilds.999.slug")]
    Get {
        /// Dot-separated document path
        path: String,
    },
    /// Set a value at a configuration path, then save
    #[command(long_about = "\
Set a value at a configuration path, then save.

The value is parsed as JSON where possible; anything that does not \
parse is stored as a string. Use --list to split a comma-joined \
value into a sequence. Missing intermediate containers are created \
along the path.

Examples:
  switchboard config set telegram.botToken 12345:ABC
  switchboard config set discord.enabled false
  switchboard config set telegram.allowFrom 111,222 --list
  switchboard config set slack.mediaMaxMb 25 --apply")]
    Set {
        /// Dot-separated document path
        path: String,
        /// New value (JSON, or a bare string)
        value: String,
        /// Split a comma-joined value into a sequence of strings
        #[arg(long)]
        list: bool,
        /// Apply (restarting affected channels) instead of saving
        #[arg(long)]
        apply: bool,
    },
    /// Remove the value at a configuration path, then save
    Unset {
        /// Dot-separated document path
        path: String,
        /// Apply (restarting affected channels) instead of saving
        #[arg(long)]
        apply: bool,
    },
    /// Push the session's configuration and restart affected channels
    Apply {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "chefchat")]
#[command(
    about = "Talk food with Chef Carmy from The Original Beef of Chicagoland",
    long_about = "Talk food with Chef Carmy from The Original Beef of Chicagoland\n\nType quit, exit or bye to leave.\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default lookup path when --config is not provided:\n    1. $XDG_CONFIG_HOME/chefchat/config.toml\n    2. ~/.config/chefchat/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log redacted provider HTTP traffic to stderr.
    #[arg(long)]
    pub verbose: bool,
}

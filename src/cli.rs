use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "wow-addon-updater",
    about = "WoW Addon Updater - keeps classic and retail addons up to date",
    version,
    author
)]
pub struct Cli {
    /// Path to the configuration file (created with defaults if missing)
    #[arg(short, long, default_value = "config.yaml", global = true)]
    pub config: String,

    /// Path to the hidden file recording installed addon versions
    #[arg(long, value_name = "FILE", default_value = ".versions", global = true)]
    pub versions: String,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Wait for Enter before exiting (useful when launched by double-click)
    #[arg(long, global = true)]
    pub pause: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and install every addon whose latest version differs from the recorded one
    Update,

    /// Check for available addon updates without downloading them
    Check,

    /// List the addon versions recorded by previous updates
    List,
}

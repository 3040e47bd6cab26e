use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ghost_core::Lifetime;

#[derive(Parser)]
#[command(name = "ghost")]
#[command(about = "Send notes and files anonymously with a self-destruct system")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Override the API origin for this invocation
    #[arg(long, global = true, value_name = "URL")]
    pub api_base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload files and create a self-destructing share link
    #[command(alias = "share")]
    Send(SendArgs),
    /// Show the expiration timestamp a lifetime would produce
    Expiry {
        /// Lifetime code: none, 5m, 30m, 1h, 4h, 12h, 1d, 3d, 7d
        #[arg(default_value = "none")]
        lifetime: Lifetime,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print or download the QR code for a link
    Qr {
        /// Link to encode
        url: String,
        /// Image edge length in pixels
        #[arg(long, default_value_t = ghost_core::qr::QR_PREVIEW_SIZE)]
        size: u32,
        /// Save the PNG instead of printing the image URL
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Manage CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional path to write script (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SendArgs {
    /// Message text (read from piped stdin when omitted)
    pub message: Vec<String>,
    /// File to upload (repeatable)
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,
    /// How long the link stays valid
    #[arg(short, long, default_value = "none")]
    pub lifetime: Lifetime,
    /// Maximum number of views (unlimited when omitted)
    #[arg(long, value_name = "N")]
    pub max_views: Option<String>,
    /// Password protecting the link
    #[arg(long)]
    pub password: Option<String>,
    /// Password confirmation (defaults to --password)
    #[arg(long)]
    pub confirm_password: Option<String>,
    /// Only allow this IPv4 address to open the link
    #[arg(long, value_name = "IP")]
    pub allow_ip: Option<String>,
    /// Retry failed uploads this many times
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub retries: u32,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
    /// Save the QR code PNG of the share link
    #[arg(long, value_name = "PATH")]
    pub qr_output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update a CLI profile
    Init {
        /// Profile name (defaults to active or "default")
        #[arg(long)]
        profile: Option<String>,
        /// API origin for this profile
        #[arg(long)]
        api_base_url: Option<String>,
        /// Mark uploaded files as public
        #[arg(long)]
        public_uploads: Option<bool>,
        /// Do not switch active profile after init
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved configuration
    Show {
        /// Profile name (defaults to active or "default")
        #[arg(long)]
        profile: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// clipcoach - Upload gameplay clips, read the feedback, ask follow-ups
#[derive(Parser, Debug)]
#[command(name = "clipcoach")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a clip for analysis
    Upload {
        /// Local video file to upload
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Public URL of the video instead of a file
        #[arg(short, long)]
        url: Option<String>,

        /// Print the feedback as JSON
        #[arg(long)]
        json: bool,
    },

    /// List analysed clips, generating missing thumbnails
    Gallery {
        /// Only list; do not request thumbnail generation
        #[arg(long)]
        no_thumbnails: bool,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate the thumbnail for one clip
    Thumbnail {
        /// Video ID
        id: String,
    },

    /// Show the feedback for a clip
    Feedback {
        /// Video ID
        id: String,

        /// Print the feedback as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask follow-up questions about a clip
    Chat {
        /// Video ID
        id: String,

        /// Send a single message instead of starting an interactive session
        #[arg(short, long)]
        message: Option<String>,

        /// Clip summary to send with each message (looked up when omitted)
        #[arg(short, long)]
        summary: Option<String>,
    },

    /// Launch the interactive TUI
    Tui,

    /// Check configuration and service connectivity
    Doctor {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

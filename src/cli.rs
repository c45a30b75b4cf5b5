//! CLI argument parsing using clap v4

use clap::{Parser, Subcommand};

/// persona-engine - Evidence-backed persona analysis
///
/// Reads a user's public posts and comments, and writes a persona record in
/// which every claim cites the items that support it.
#[derive(Parser, Debug)]
#[command(name = "persona-engine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a profile document and emit the persona record
    Analyze(AnalyzeArgs),

    /// Rule table management
    Rules {
        #[command(subcommand)]
        subcommand: RulesSubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Options for `analyze`
#[derive(clap::Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Profile or Listing JSON document ("-" for stdin)
    #[arg(short, long)]
    pub input: String,

    /// Path to configuration file
    #[arg(short, long, env = "PERSONA_ENGINE_CONFIG")]
    pub config: Option<String>,

    /// Custom rule table (overrides rules.path)
    #[arg(long)]
    pub rules: Option<String>,

    /// Write the record here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Username recorded in the persona (defaults to the document's)
    #[arg(long)]
    pub subject: Option<String>,

    /// Maximum posts to analyze
    #[arg(long)]
    pub posts_limit: Option<usize>,

    /// Maximum comments to analyze
    #[arg(long)]
    pub comments_limit: Option<usize>,

    /// Classify dimensions in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Single-line JSON output
    #[arg(long)]
    pub compact: bool,
}

/// Rule table subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum RulesSubcommand {
    /// Print the effective rule table
    Show {
        /// Rule table to show (bundled table when omitted)
        #[arg(short, long)]
        rules: Option<String>,
    },

    /// Check a rule table for errors
    Validate {
        /// Rule table to validate
        rules: String,
    },

    /// Write the bundled rule table to a file for editing
    Init {
        /// Destination path
        #[arg(short, long, default_value = "rules.toml")]
        path: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

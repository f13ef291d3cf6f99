use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipvault")]
#[command(author, version, about = "Video delivery service with range streaming")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the delivery server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Resolve a handle and show where its file was found
    Locate {
        /// Video id or slug
        #[arg(required = true)]
        handle: String,

        /// Resolve slug first, as the short-link route does
        #[arg(long)]
        slug: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

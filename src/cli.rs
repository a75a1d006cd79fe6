use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaforge")]
#[command(author, version, about = "Media conversion job runner")]
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
    /// Convert a single file and wait for the job to finish
    Convert {
        /// Input file to convert
        #[arg(required = true)]
        input: PathBuf,

        /// Conversion options as JSON, or @path to read them from a file
        #[arg(short, long, default_value = "{}")]
        options: String,

        /// Declared MIME type (guessed from the extension if omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Identify a file with the matching inspector
    Identify {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Declared MIME type (guessed from the extension if omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

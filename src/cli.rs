use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vrgate")]
#[command(author, version, about = "Range-aware media gateway for VR players")]
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
    /// Start the gateway
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
        /// Config file to validate (falls back to --config)
        file: Option<PathBuf>,
    },

    /// Run the image pipeline on a local file
    Transcode {
        /// Image to normalize
        #[arg(required = true)]
        input: PathBuf,

        /// Where to write the result (defaults to <input stem>.vrgate.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Declared content type (guessed from the extension if omitted)
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Generate a random client token for auth.tokens
    GenerateToken,

    /// Display version information
    Version,
}

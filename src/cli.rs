use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tubely")]
#[command(author, version, about = "Media asset pipeline for video hosting")]
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
    /// Probe a video file and print its aspect ratio
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remux a video for fast-start playback (writes <file>.processing)
    Faststart {
        /// Video to remux
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Generate an asset key for a media type
    Key {
        /// Media type, e.g. video/mp4
        media_type: String,
    },

    /// Run a file through the full pipeline, storing objects locally
    Publish {
        /// File to publish
        #[arg(required = true)]
        file: PathBuf,

        /// Declared media type of the file
        #[arg(long, default_value = "video/mp4")]
        media_type: String,

        /// Title for the video record
        #[arg(long, default_value = "untitled")]
        title: String,

        /// Publish the file as the record's thumbnail instead of its video
        #[arg(long)]
        thumbnail: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config or defaults if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

//! ClipFlow CLI — Command-line interface for timeline export.
//!
//! Usage:
//!   clipflow export <TIMELINE>     Export a timeline to video or EDL JSON
//!   clipflow validate <TIMELINE>   Validate a timeline document
//!   clipflow info <TIMELINE>       Show timeline and EDL information

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "clipflow",
    about = "Export pipeline for browser-edited video timelines",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a timeline document to video or EDL JSON
    Export {
        /// Path to the timeline JSON document
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export type: mp4 | json (defaults to the configured type)
        #[arg(short = 't', long)]
        export_type: Option<String>,

        /// Quality preset: 720p | 1080p | 4k (defaults to the configured preset)
        #[arg(short, long)]
        quality: Option<String>,

        /// Render service base URL (overrides config)
        #[arg(long)]
        render_url: Option<String>,

        /// Media proxy URL (overrides config)
        #[arg(long)]
        proxy_url: Option<String>,

        /// Directory of local media files registered as blob: sources
        /// under their file stem
        #[arg(long)]
        media_dir: Option<PathBuf>,
    },

    /// Validate a timeline document
    Validate {
        /// Path to the timeline JSON document
        path: PathBuf,
    },

    /// Show timeline and EDL information
    Info {
        /// Path to the timeline JSON document
        path: PathBuf,

        /// Quality preset used for the EDL summary
        #[arg(short, long, default_value = "1080p")]
        quality: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    clipflow_common::logging::init_logging(&clipflow_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Export {
            path,
            output,
            export_type,
            quality,
            render_url,
            proxy_url,
            media_dir,
        } => {
            commands::export::run(
                path,
                output,
                export_type,
                quality,
                render_url,
                proxy_url,
                media_dir,
            )
            .await
        }
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path, quality } => commands::info::run(path, quality),
    }
}

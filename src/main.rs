use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gwstat::commands::{parse, status, watch};
use gwstat::config::Overrides;
use gwstat::decode::PayloadFormat;
use gwstat::logging::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gwstat")]
#[command(about = "Watch gravitational-wave detector status for changes", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the status source and report detector changes
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Seconds between polls
        #[arg(short, long)]
        interval: Option<u64>,

        /// Chat webhook URL to notify on changes
        #[arg(long)]
        webhook: Option<String>,

        /// Channel to post to (requires a webhook)
        #[arg(long)]
        channel: Option<String>,

        /// Stop after this many polls (at least 1)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_polls: Option<u64>,
    },

    /// Fetch and print the current status once
    Status {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Decode a saved status payload and print it
    Parse {
        /// Payload file (JSON document or HTML page)
        file: PathBuf,

        /// Payload format
        #[arg(short, long, value_enum)]
        format: Option<PayloadFormat>,

        /// Config file (defaults to ~/.config/gwstat/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the decoded snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Status URL
    #[arg(short, long)]
    url: Option<String>,

    /// Payload format served at the URL
    #[arg(short, long, value_enum)]
    format: Option<PayloadFormat>,

    /// Config file (defaults to ~/.config/gwstat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Watch {
            source,
            interval,
            webhook,
            channel,
            max_polls,
        } => {
            let overrides = Overrides {
                url: source.url,
                format: source.format,
                interval_secs: interval,
                webhook,
                channel,
            };
            watch::execute(source.config.as_deref(), overrides, max_polls)
        }
        Commands::Status { source } => {
            let overrides = Overrides {
                url: source.url,
                format: source.format,
                ..Default::default()
            };
            status::execute(source.config.as_deref(), overrides)
        }
        Commands::Parse {
            file,
            format,
            config,
            json,
        } => parse::execute(&file, format, config.as_deref(), json),
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "slowroll",
    about = "Slowroll — deterministic, time-ramped rollouts",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Client configuration file (slowroll.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide which value an identity gets for one rollout entry.
    ///
    /// The document is read from --url, --file, or the `url` in the
    /// configuration file, in that order.
    Decide {
        /// Section of the rollout document
        #[arg(short, long)]
        section: String,
        /// Key within the section
        #[arg(short, long)]
        key: String,
        /// Identity (user, host, ...) to decide for
        #[arg(short, long)]
        identity: String,
        /// Document URL (http:// or file://)
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,
        /// Local document path
        #[arg(long)]
        file: Option<PathBuf>,
        /// Evaluate at this time instead of now ("YYYY-MM-DD HH:MM[:SS[.ffffff]]Z")
        #[arg(long)]
        now: Option<String>,
        /// JSON value to print when the entry is not configured
        #[arg(long)]
        default: Option<String>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Show the bucket and scalar position of an identity
    Bucket {
        identity: String,
    },
    /// Parse a compact duration ("1h 30m", "250ms")
    ParseDuration {
        text: String,
    },
    /// Parse a rollout timestamp ("2023-01-01 00:00Z")
    ParseTime {
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slowroll=info,slowroll_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decide {
            section,
            key,
            identity,
            url,
            file,
            now,
            default,
            format,
        } => {
            let source = commands::decide::Source {
                config: cli.config,
                url,
                file,
            };
            let request = commands::decide::Request {
                section,
                key,
                identity,
                now,
                default,
            };
            commands::decide::decide(source, request, &format).await
        }
        Commands::Bucket { identity } => commands::inspect::bucket(&identity),
        Commands::ParseDuration { text } => commands::inspect::parse_duration(&text),
        Commands::ParseTime { text } => commands::inspect::parse_time(&text),
    }
}

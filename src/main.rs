mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::OutputFormat;
use hubstats::config::Config;

#[derive(Parser)]
#[command(
    name = "hubstats",
    version,
    about = "Adoption analytics over Hub model, dataset and space snapshots",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); defaults and HUBSTATS_* variables apply otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print monthly trends and license / SDK distributions
    Report {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Categories shown per distribution before folding into "Other"
        #[arg(long, default_value = "4")]
        top: usize,
    },

    /// Print the cumulative growth of models derived from a base model
    Growth {
        /// Base model identifier, e.g. meta-llama/Llama-2-7b-hf
        base: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Serve the aggregates as a JSON API
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Commands::Serve {
        bind: Some(bind), ..
    } = &cli.command
    {
        config.server.bind_address = bind.clone();
    }
    config.validate().context("Invalid configuration")?;

    setup_tracing(&config.logging.level, &config.logging.format, cli.verbose)?;

    tracing::info!("hubstats starting");

    match cli.command {
        Commands::Report { format, top } => {
            tracing::info!(format = ?format, top = %top, "Starting report command");
            commands::report(config, format, top).await?;
        }

        Commands::Growth { base, format } => {
            tracing::info!(base = %base, format = ?format, "Starting growth command");
            commands::growth(config, base, format).await?;
        }

        Commands::Serve { .. } => {
            tracing::info!(bind = %config.server.bind_address, "Starting serve command");
            commands::serve(config).await?;
        }
    }

    tracing::info!("hubstats completed successfully");
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?.with_env_overrides(|key| std::env::var(key).ok())?,
        None => Config::from_env()?,
    };
    Ok(config)
}

fn setup_tracing(level: &str, format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("hubstats=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("hubstats={level},warn")))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

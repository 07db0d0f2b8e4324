use clap::{Parser, Subcommand};
use config::{Config, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod logging;
mod poller;

#[derive(Parser)]
#[command(version, about = "Polls HTTP endpoints and prints their JSON as events")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Poll every configured endpoint until interrupted
    Run {
        #[arg(long, short)]
        config: PathBuf,
    },
    /// Poll every configured endpoint once and exit
    Once {
        #[arg(long, short)]
        config: PathBuf,
    },
    /// Validate the configuration file and exit
    Check {
        #[arg(long, short)]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let path = match &cli.command {
        CliCommand::Run { config } | CliCommand::Once { config } | CliCommand::Check { config } => {
            config
        }
    };

    let config = match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    if let CliCommand::Check { .. } = cli.command {
        println!("Configuration OK");
        return ExitCode::SUCCESS;
    }

    let _sentry = logging::init(&config.logging);

    if let Some(metrics_config) = &config.metrics
        && let Err(e) = init_metrics(metrics_config)
    {
        tracing::error!(error = %e, "Failed to initialize metrics, continuing without");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(async {
        let scheduled = poller::build_collectors(&config)?;
        match cli.command {
            CliCommand::Once { .. } => poller::run_once(scheduled).await,
            _ => {
                tracing::info!(collectors = scheduled.len(), "Starting jsonpoll");
                poller::run(scheduled, async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for shutdown signal");
                        std::future::pending::<()>().await;
                    }
                })
                .await
            }
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "jsonpoll failed");
            ExitCode::FAILURE
        }
    }
}

fn init_metrics(config: &MetricsConfig) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))?;
    metrics::set_global_recorder(recorder)
        .map_err(|_| "a metrics recorder is already installed")?;
    shared::metrics_defs::describe_all(http_json::metrics_defs::ALL_METRICS);

    Ok(())
}

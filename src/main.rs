use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use oracle_feeder::blockchain::{LcdClient, TxSubmitter, Wallet};
use oracle_feeder::config::load_config;
use oracle_feeder::config::validation::parse_endpoint;
use oracle_feeder::lifecycle::{signals, Collaborators, Supervisor};
use oracle_feeder::observability::{logging, metrics};
use oracle_feeder::voting::{OsSalt, VoterIdentity};

#[derive(Parser)]
#[command(name = "oracle-feeder")]
#[command(about = "Submits oracle exchange-rate votes once per vote period", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init_logging(&config.observability);

    tracing::info!("oracle-feeder v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        target_lcd = %config.target.lcd_url,
        target_chain = %config.target.chain_id,
        reference_lcd = %config.reference.lcd_url,
        commit_timeout_ms = config.timing.commit_timeout_ms,
        refresh_interval_ms = config.timing.refresh_interval_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let wallet = Wallet::from_env()?;
    let voter = VoterIdentity {
        feeder: config.voter.feeder_address.clone(),
        validator: config.voter.validator_address.clone(),
    };
    tracing::info!(feeder = %voter.feeder, validator = %voter.validator, "Voting as");

    let target = LcdClient::new(&config.target.lcd_url, config.target.request_timeout_secs)?;
    let reference =
        LcdClient::new(&config.reference.lcd_url, config.reference.request_timeout_secs)?;
    let submitter = TxSubmitter::new(
        target.clone(),
        wallet,
        voter.feeder.clone(),
        &config.target,
    )?;
    let endpoint = parse_endpoint(&config.target.lcd_url)?;

    let supervisor = Supervisor::new(
        Collaborators {
            chain: Arc::new(target),
            rates: Arc::new(reference),
            broadcaster: Arc::new(submitter),
            salts: Arc::new(OsSalt),
        },
        endpoint,
        voter,
        config.timing.clone(),
        config.default_params.clone(),
    );

    tokio::select! {
        _ = supervisor.run() => {}
        _ = signals::termination() => {}
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

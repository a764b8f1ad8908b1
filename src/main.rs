use oracle_updater::core::{logging, Config};
use oracle_updater::ledger::JsonRpcLedger;
use oracle_updater::oracle::Oracle;
use std::process::ExitCode;
use tracing::Instrument;
use uuid::Uuid;

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Oracle update failed: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚀 Oracle updater starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Mode: {:?}, RPC: {}",
        config.oracle.mode,
        config.ledger.rpc_url
    );

    let span = tracing::info_span!("oracle_run", run_id = %Uuid::new_v4());
    let outcome = async {
        let oracle = Oracle::<JsonRpcLedger>::from_config(&config)?;
        let record = oracle.run().await?;
        anyhow::Ok(record)
    }
    .instrument(span)
    .await;

    match outcome {
        Ok(record) => {
            match serde_json::to_string(&record) {
                Ok(json) => tracing::info!(record = %json, "✅ Oracle update complete"),
                Err(_) => tracing::info!("✅ Oracle update complete"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("❌ Oracle update failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

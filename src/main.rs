// ============================================================================
// Pricesheet - Service relais
// ============================================================================
// Écoute POST / ; à chaque appel (scheduler, webhook) :
//   pour USDC, JPY, USD : dernière barre horaire BTC/<symbole> sur
//   CryptoCompare -> nouvelle ligne dans l'onglet correspondant
//
// Le token OAuth2 doit exister (outil `authorize`) : le service se contente
// de le rafraîchir.
// ============================================================================

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{error, info};

use pricesheet::config::Config;
use pricesheet::logging::init_logging;
use pricesheet::relay::Relay;
use pricesheet::server;

#[tokio::main]
async fn main() -> Result<()> {
    // La config d'abord : elle décide où vont les logs
    let config = Config::from_env().context("Configuration invalide")?;

    init_logging(config.log_dir.as_deref(), "pricesheet.log").unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
    });

    let targets: Vec<String> = config.targets.iter().map(ToString::to_string).collect();
    info!(
        spreadsheet = %config.spreadsheet_id,
        targets = ?targets,
        timezone = %config.timezone,
        token_path = %config.auth.token_path.display(),
        "Pricesheet starting up"
    );

    let relay = Relay::from_config(&config)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let result = server::serve(relay, addr).await;
    match &result {
        Ok(_) => info!("Pricesheet exited normally"),
        Err(e) => error!(error = ?e, "Pricesheet exited with error"),
    }
    result
}

// ============================================================================
// Pricesheet - Outil d'autorisation
// ============================================================================
// Produit (ou rafraîchit) le token.json consommé par le service.
// À lancer sur une machine avec un navigateur :
//
//   CLIENT_SECRETS_PATH=credentials.json TOKEN_PATH=token.json cargo run --bin authorize
//
// Même algorithme que le service, mais avec le flow interactif :
// - token valide     -> rien à faire
// - token expiré     -> refresh
// - sinon            -> URL de consentement + redirection loopback
// ============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use pricesheet::api::OAuthClient;
use pricesheet::auth::{CredentialManager, CredentialSource, FileCredentialStore, InstalledAppFlow};
use pricesheet::config::AuthSettings;
use pricesheet::logging::{default_log_dir, init_logging};
use pricesheet::models::ClientSecrets;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(default_log_dir().as_deref(), "authorize.log").unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
    });

    let settings = AuthSettings::from_env().context("Configuration invalide")?;
    let secrets = ClientSecrets::from_file(&settings.client_secrets_path)?;
    info!(
        client_secrets = %settings.client_secrets_path.display(),
        token_path = %settings.token_path.display(),
        port = settings.auth_port,
        "Authorization tool starting"
    );

    let manager = CredentialManager::new(
        Arc::new(FileCredentialStore::new(&settings.token_path)),
        Arc::new(OAuthClient::new()),
        Arc::new(InstalledAppFlow::new(secrets, settings.auth_port)),
    );

    let acquired = manager
        .acquire()
        .await
        .context("Impossible d'obtenir un token")?;

    match acquired.source {
        CredentialSource::Reused => println!("✅ Le token existant est encore valide, rien à faire."),
        CredentialSource::Refreshed => println!("✅ Token rafraîchi."),
        CredentialSource::Authorized => println!("✅ Nouveau token obtenu."),
    }
    println!("   -> {}", settings.token_path.display());

    Ok(())
}

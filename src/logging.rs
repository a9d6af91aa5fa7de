// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Tracing subscriber
// - Registry : point central des logs
// - Layer : transforme et route les logs
// - EnvFilter : filtre par niveau (RUST_LOG env var)
// - RollingFileAppender : rotation automatique
//
// Les logs vont toujours sur stdout (service, collecteur de logs) et, si un
// répertoire est fourni, aussi dans un fichier avec rotation quotidienne.
//
// # Utilisation
// ```bash
// RUST_LOG=debug cargo run
// RUST_LOG=pricesheet=trace cargo run
// LOG_DIR=./logs cargo run
// ```
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filtre par défaut : debug pour le crate, info pour les dépendances
const DEFAULT_FILTER: &str = "pricesheet=debug,info";

/// Répertoire de logs par défaut de l'outil `authorize`
///
/// - Linux : ~/.local/share/pricesheet/logs
/// - macOS : ~/Library/Application Support/pricesheet/logs
/// - Windows : C:\Users\<user>\AppData\Local\pricesheet\logs
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("pricesheet").join("logs"))
}

/// Initialise le subscriber global
///
/// `file_name` : nom de base du fichier (ex: "pricesheet.log")
pub fn init_logging(log_dir: Option<&Path>, file_name: &str) -> Result<()> {
    // CONCEPT RUST : Option<Layer>
    // - Option<L> implémente Layer : None = couche désactivée
    // - Évite deux chaînes de builder différentes
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).context("Échec de la création du répertoire de logs")?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, file_name);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false) // Pas de codes couleur dans le fichier
                    .with_target(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .try_init()
        .context("Le logging est déjà initialisé")?;

    info!(log_dir = ?log_dir, "Logging initialisé");
    Ok(())
}

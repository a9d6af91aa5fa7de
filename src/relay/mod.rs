// ============================================================================
// Module : relay
// ============================================================================
// Une invocation du trigger :
//   pour chaque (feuille, symbole) du mapping, dans l'ordre :
//     fetch -> si données : mise à jour de la feuille
//                sinon     : skip
//
// Aucune erreur d'un symbole ne sort de la boucle : chaque symbole produit
// un SymbolOutcome dans le RunReport.
// ============================================================================

pub mod updater; // Placement de ligne et écriture

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument, warn};

use crate::api::{log_fetch_error, CryptoCompareClient, GoogleSheetsClient, OAuthClient, PriceSource};
use crate::auth::{Acquired, CredentialManager, FileCredentialStore, OutOfBandAuthorizer};
use crate::config::Config;
use crate::error::{UpdateError, REAUTH_ADVICE};
use crate::models::{FailureKind, PriceRecord, RunReport, SheetTarget, SymbolOutcome};

pub use updater::{next_row, AppendSummary, SheetUpdater, FIRST_DATA_ROW};

/// Échec d'ouverture de session, mémorisé pour toute l'invocation
type SessionFailure = (FailureKind, String);

/// Le relais : mapping + source de prix + updater
#[derive(Clone)]
pub struct Relay {
    targets: Vec<SheetTarget>,
    prices: Arc<dyn PriceSource>,
    updater: SheetUpdater,
}

impl Relay {
    pub fn new(targets: Vec<SheetTarget>, prices: Arc<dyn PriceSource>, updater: SheetUpdater) -> Self {
        Self {
            targets,
            prices,
            updater,
        }
    }

    /// Branche les vrais clients (CryptoCompare, Google Sheets, token.json)
    pub fn from_config(config: &Config) -> Result<Self> {
        let prices = CryptoCompareClient::from_config(config)
            .context("Échec de la création du client CryptoCompare")?;
        let sheets = GoogleSheetsClient::new(&config.sheets_api_url, &config.spreadsheet_id)
            .context("Échec de la création du client Google Sheets")?;

        let credentials = CredentialManager::new(
            Arc::new(FileCredentialStore::new(&config.auth.token_path)),
            Arc::new(OAuthClient::new()),
            Arc::new(OutOfBandAuthorizer::new(&config.auth.token_path)),
        );

        Ok(Self::new(
            config.targets.clone(),
            Arc::new(prices),
            SheetUpdater::new(Arc::new(sheets), credentials),
        ))
    }

    /// Traite tous les symboles, séquentiellement, et retourne le rapport
    ///
    /// CONCEPT RUST : tokio::sync::OnceCell
    /// - Le credential n'est obtenu qu'au premier fetch réussi
    /// - Puis partagé par toutes les écritures de l'invocation (jamais re-acquis)
    #[instrument(skip(self), fields(targets = self.targets.len()))]
    pub async fn run(&self) -> RunReport {
        let session: OnceCell<Result<Acquired, SessionFailure>> = OnceCell::new();
        let mut report = RunReport::new();

        for target in &self.targets {
            let outcome = self.process(target, &session).await;
            report.push(&target.sheet, &target.symbol, outcome);
        }

        info!(
            updated = report.updated(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Relay run finished"
        );
        report
    }

    async fn process(
        &self,
        target: &SheetTarget,
        session: &OnceCell<Result<Acquired, SessionFailure>>,
    ) -> SymbolOutcome {
        let record = match self.prices.fetch_latest(&target.symbol).await {
            Ok(record) => record,
            Err(e) => {
                log_fetch_error(&target.symbol, &e);
                info!(sheet = %target.sheet, "No data to update, skipping");
                return SymbolOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let credential = match session.get_or_init(|| self.open_session()).await {
            Ok(credential) => credential,
            Err((kind, reason)) => {
                return SymbolOutcome::Failed {
                    kind: *kind,
                    reason: reason.clone(),
                }
            }
        };

        self.write(credential, &record, target).await
    }

    async fn open_session(&self) -> Result<Acquired, SessionFailure> {
        self.updater.session().await.map_err(|e| {
            log_update_error("*", &e);
            let kind = if e.is_invalid_grant() {
                FailureKind::InvalidGrant
            } else {
                FailureKind::Credential
            };
            (kind, e.to_string())
        })
    }

    async fn write(&self, credential: &Acquired, record: &PriceRecord, target: &SheetTarget) -> SymbolOutcome {
        match self.updater.append(credential, record, &target.sheet).await {
            Ok(summary) => {
                info!(sheet = %target.sheet, row = summary.row, "Data updated to Google Sheets successfully");
                SymbolOutcome::Updated {
                    row: summary.row,
                    cells: summary.cells,
                }
            }
            Err(e) => {
                let e = UpdateError::from(e);
                log_update_error(&target.sheet, &e);
                let kind = if e.is_invalid_grant() {
                    FailureKind::InvalidGrant
                } else {
                    FailureKind::Write
                };
                SymbolOutcome::Failed {
                    kind,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Log d'une erreur de mise à jour, avec le conseil de ré-authentification
/// quand le grant est invalide
fn log_update_error(sheet: &str, e: &UpdateError) {
    error!(sheet = %sheet, error = %e, "Error updating Google Sheet");
    if e.is_invalid_grant() {
        warn!("{}", REAUTH_ADVICE);
    }
}

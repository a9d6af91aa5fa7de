// ============================================================================
// SheetUpdater : écrit un PriceRecord comme nouvelle ligne d'une feuille
// ============================================================================
// Placement de la ligne :
// - on lit toute la colonne A de la feuille
// - n = nombre de lignes existantes
// - ligne cible = max(n + 1, 3) : les lignes 1 et 2 (en-têtes) ne sont
//   jamais écrasées, même sur une feuille vide
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::api::{a1_range, SheetsApi};
use crate::auth::{Acquired, CredentialManager};
use crate::error::{SheetError, UpdateError};
use crate::models::PriceRecord;

/// Première ligne de données (1 et 2 sont réservées aux en-têtes)
pub const FIRST_DATA_ROW: u32 = 3;

/// Ligne cible pour `existing_rows` lignes déjà présentes en colonne A
pub fn next_row(existing_rows: usize) -> u32 {
    let after_last = u32::try_from(existing_rows)
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    after_last.max(FIRST_DATA_ROW)
}

/// Résultat d'une écriture réussie
#[derive(Debug, Clone, PartialEq)]
pub struct AppendSummary {
    /// Ligne écrite (1-based)
    pub row: u32,
    /// Cellules mises à jour selon l'API
    pub cells: u64,
    /// Plage effectivement écrite (ex: "USDC!A6:H6")
    pub range: Option<String>,
}

/// Mise à jour d'une feuille de calcul
#[derive(Clone)]
pub struct SheetUpdater {
    sheets: Arc<dyn SheetsApi>,
    credentials: CredentialManager,
}

impl SheetUpdater {
    pub fn new(sheets: Arc<dyn SheetsApi>, credentials: CredentialManager) -> Self {
        Self { sheets, credentials }
    }

    /// Obtient le credential à partager entre toutes les écritures d'une invocation
    pub async fn session(&self) -> Result<Acquired, UpdateError> {
        Ok(self.credentials.acquire().await?)
    }

    /// Écrit `record` sur la première ligne libre de `sheet`
    #[instrument(skip(self, credential, record))]
    pub async fn append(
        &self,
        credential: &Acquired,
        record: &PriceRecord,
        sheet: &str,
    ) -> Result<AppendSummary, SheetError> {
        let token = credential.access_token();

        let existing = self.sheets.read_range(token, &a1_range(sheet, "A:A")).await?;
        let row = next_row(existing.len());
        debug!(existing_rows = existing.len(), row, "Computed target row");

        let range = a1_range(sheet, &format!("A{}", row));
        let response = self
            .sheets
            .update_range(token, &range, vec![record.to_row()])
            .await?;

        info!(row, cells = response.updated_cells, "{} cells updated in sheet {}", response.updated_cells, sheet);
        Ok(AppendSummary {
            row,
            cells: response.updated_cells,
            range: response.updated_range,
        })
    }

    /// Credential + écriture, pour une mise à jour isolée
    pub async fn update(&self, record: &PriceRecord, sheet: &str) -> Result<AppendSummary, UpdateError> {
        let credential = self.session().await?;
        Ok(self.append(&credential, record, sheet).await?)
    }
}

// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les clients des services externes :
// - CryptoCompare (prix)
// - Google Sheets (lecture/écriture de plages)
// - Endpoint token OAuth2 (refresh, échange de code)
//
// CONCEPT RUST : Traits comme coutures
// - Le relais ne connaît que PriceSource et SheetsApi
// - Les tests branchent des doubles en mémoire à la place des vrais clients
// ============================================================================

pub mod crypto_compare; // Client CryptoCompare (histohour)
pub mod oauth;          // Endpoint token OAuth2
pub mod sheets;         // Client Google Sheets v4

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{FetchError, SheetError};
use crate::models::PriceRecord;

// Re-export des types principaux
pub use crypto_compare::{log_fetch_error, parse_histohour, CryptoCompareClient};
pub use oauth::OAuthClient;
pub use sheets::{a1_range, GoogleSheetsClient, UpdateValuesResponse};

/// Source de la dernière barre horaire d'un symbole
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_latest(&self, symbol: &str) -> Result<PriceRecord, FetchError>;
}

/// Accès aux valeurs d'une feuille de calcul (déjà choisie par le client)
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Lit une plage A1 ; une plage vide retourne un Vec vide
    async fn read_range(&self, access_token: &str, range: &str) -> Result<Vec<Vec<Value>>, SheetError>;

    /// Écrit des lignes à partir du coin haut-gauche de la plage, valeurs littérales
    async fn update_range(
        &self,
        access_token: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<UpdateValuesResponse, SheetError>;
}

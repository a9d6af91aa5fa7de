// ============================================================================
// API Client : Google Sheets v4 (values)
// ============================================================================
// Deux appels seulement :
// - GET  /v4/spreadsheets/{id}/values/{range}                      (lecture)
// - PUT  /v4/spreadsheets/{id}/values/{range}?valueInputOption=RAW (écriture)
//
// Authentification : access token OAuth2 en header Bearer
// ============================================================================

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::api::SheetsApi;
use crate::error::SheetError;

/// Valeurs écrites telles quelles (pas d'interprétation de formules)
const VALUE_INPUT_OPTION: &str = "RAW";

// ============================================================================
// Structures JSON
// ============================================================================

/// Réponse d'une lecture de plage
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[allow(dead_code)]
    range: Option<String>,

    /// Absent quand la plage est vide
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Corps d'une écriture
#[derive(Debug, Serialize)]
struct ValueRangeBody<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'static str,
    values: Vec<Vec<Value>>,
}

/// Réponse d'une écriture
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateValuesResponse {
    pub updated_range: Option<String>,
    pub updated_rows: u64,
    pub updated_columns: u64,
    pub updated_cells: u64,
}

/// Format d'erreur commun des APIs Google
#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Client REST Google Sheets, limité à une feuille de calcul
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    pub fn new(base_url: &str, spreadsheet_id: &str) -> Result<Self, SheetError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SheetError::Malformed(format!("URL Sheets invalide {}: {}", base_url, e)))?;
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    /// Construit l'URL .../v4/spreadsheets/{id}/values/{range}
    ///
    /// CONCEPT RUST : path_segments_mut
    /// - Chaque segment est encodé (espaces, quotes des noms de feuille)
    /// - Évite de concaténer des chaînes non échappées dans l'URL
    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetError::Malformed(format!("URL de base invalide : {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    /// Convertit une réponse non-2xx en SheetError
    async fn error_from(response: reqwest::Response) -> SheetError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<GoogleErrorBody>(&body) {
            Ok(parsed) => match parsed.error.status {
                Some(kind) => format!("{} ({})", parsed.error.message, kind),
                None => parsed.error.message,
            },
            Err(_) => body,
        };

        warn!(status = %status, message = %message, "Google Sheets request rejected");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SheetError::Unauthorized {
                status: status.as_u16(),
                message,
            },
            _ => SheetError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    #[instrument(skip(self, access_token))]
    async fn read_range(&self, access_token: &str, range: &str) -> Result<Vec<Vec<Value>>, SheetError> {
        let url = self.values_url(range)?;
        debug!(url = %url, "Reading range");

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetError::Malformed(e.to_string()))?;

        debug!(rows = value_range.values.len(), "Range read");
        Ok(value_range.values)
    }

    #[instrument(skip(self, access_token, values))]
    async fn update_range(
        &self,
        access_token: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<UpdateValuesResponse, SheetError> {
        let url = self.values_url(range)?;
        debug!(url = %url, rows = values.len(), "Writing range");

        let body = ValueRangeBody {
            range,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .client
            .put(url)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| SheetError::Malformed(e.to_string()))
    }
}

// ============================================================================
// Notation A1
// ============================================================================

/// Préfixe une plage avec le nom de la feuille : "USDC!A:A", "'My Sheet'!A3"
///
/// Les noms contenant autre chose que lettres, chiffres ou '_' sont entourés
/// de quotes simples (quotes internes doublées), comme l'exige la notation A1.
pub fn a1_range(sheet: &str, cells: &str) -> String {
    let plain = sheet.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        format!("{}!{}", sheet, cells)
    } else {
        format!("'{}'!{}", sheet.replace('\'', "''"), cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_range() {
        assert_eq!(a1_range("USDC", "A:A"), "USDC!A:A");
        assert_eq!(a1_range("USD", "A6"), "USD!A6");
        assert_eq!(a1_range("My Sheet", "A:A"), "'My Sheet'!A:A");
        assert_eq!(a1_range("Bob's", "A3"), "'Bob''s'!A3");
    }

    #[test]
    fn test_values_url_encodes_range() {
        let client = GoogleSheetsClient::new("https://sheets.googleapis.com", "abc123").unwrap();

        let url = client.values_url("USDC!A:A").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/USDC!A:A"
        );

        let url = client.values_url("'My Sheet'!A3").unwrap();
        assert!(url.as_str().ends_with("/values/'My%20Sheet'!A3"));
    }

    #[test]
    fn test_update_response_defaults() {
        let parsed: UpdateValuesResponse =
            serde_json::from_str(r#"{"spreadsheetId": "abc", "updatedCells": 8}"#).unwrap();
        assert_eq!(parsed.updated_cells, 8);
        assert_eq!(parsed.updated_rows, 0);
    }
}

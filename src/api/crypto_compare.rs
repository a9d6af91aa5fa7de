// ============================================================================
// API Client : CryptoCompare
// ============================================================================
// Récupère la dernière barre horaire d'un symbole (coté contre BTC) et la
// convertit en PriceRecord dans le fuseau configuré
//
// Endpoint : GET /data/histohour?fsym=BTC&tsym=<symbole>&limit=2
// - limit=2 : l'API renvoie les barres les plus récentes, la dernière du
//   tableau "Data" est celle qu'on écrit
// - Succès : Response == "Success" ET au moins 2 barres
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::api::PriceSource;
use crate::config::Config;
use crate::error::FetchError;
use crate::models::PriceRecord;

/// Nombre de barres demandées
const BAR_LIMIT: u32 = 2;

/// Nombre minimum de barres pour considérer la réponse exploitable
const MIN_BARS: usize = 2;

// ============================================================================
// Structures pour parser la réponse JSON de CryptoCompare
// ============================================================================
// CONCEPT RUST : #[serde(rename = "...")]
// - L'API utilise "Response", "Message", "Data" (PascalCase)
// - Les barres utilisent des noms en minuscules collées (volumefrom, volumeto)
// ============================================================================

/// Enveloppe de la réponse histohour
#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: String,

    #[serde(rename = "Message", default)]
    message: Option<String>,

    /// Tableau de barres en cas de succès, parfois {} ou absent en cas d'erreur
    #[serde(rename = "Data", default)]
    data: serde_json::Value,
}

/// Une barre horaire OHLCV
#[derive(Debug, Deserialize)]
struct HourlyBar {
    /// Début de la barre, epoch UTC en secondes
    time: i64,
    high: f64,
    low: f64,
    open: f64,
    close: f64,
    volumefrom: f64,
    volumeto: f64,
}

// ============================================================================
// Client
// ============================================================================

/// Client CryptoCompare pour la dernière barre horaire
#[derive(Debug, Clone)]
pub struct CryptoCompareClient {
    client: reqwest::Client,
    base_url: String,
    base_asset: String,
    timezone: Tz,
    api_key: Option<String>,
}

impl CryptoCompareClient {
    /// Crée un client avec un timeout par requête
    pub fn new(
        base_url: &str,
        base_asset: &str,
        timezone: Tz,
        timeout: Duration,
        api_key: Option<String>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            base_asset: base_asset.to_string(),
            timezone,
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            &config.crypto_compare_url,
            &config.base_asset,
            config.timezone,
            config.fetch_timeout,
            config.crypto_compare_api_key.clone(),
        )
    }

    /// Récupère la dernière barre horaire de `symbol`
    ///
    /// Toutes les erreurs sont typées (transport, statut HTTP, JSON,
    /// erreur signalée par l'API, pas assez de barres).
    #[instrument(skip(self), fields(base = %self.base_asset))]
    pub async fn fetch_latest(&self, symbol: &str) -> Result<PriceRecord, FetchError> {
        let url = format!("{}/data/histohour", self.base_url);
        let limit = BAR_LIMIT.to_string();

        let mut request = self.client.get(&url).query(&[
            ("fsym", self.base_asset.as_str()),
            ("tsym", symbol),
            ("limit", limit.as_str()),
        ]);

        if let Some(ref api_key) = self.api_key {
            request = request.header("Authorization", format!("Apikey {}", api_key));
        }

        debug!(url = %url, "Sending histohour request");
        let response = request.send().await?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let record = parse_histohour(&body, &self.timezone)?;

        info!(date = %record.date, time = %record.time, close = record.close, "Fetched latest hourly bar");
        Ok(record)
    }

    /// Version "absent en cas d'échec" : log l'erreur et retourne None
    ///
    /// Un échec pour un symbole ne doit jamais interrompre les autres.
    pub async fn fetch(&self, symbol: &str) -> Option<PriceRecord> {
        match self.fetch_latest(symbol).await {
            Ok(record) => Some(record),
            Err(e) => {
                log_fetch_error(symbol, &e);
                None
            }
        }
    }
}

/// Log d'un échec de fetch
///
/// - pas de données côté API (marché inconnu, trop peu de barres) : warn
/// - transport, statut HTTP, JSON invalide : error
pub fn log_fetch_error(symbol: &str, e: &FetchError) {
    if e.is_no_data() {
        warn!(symbol = %symbol, error = %e, "No price data");
    } else {
        error!(symbol = %symbol, error = %e, "Error fetching price data");
    }
}

#[async_trait]
impl PriceSource for CryptoCompareClient {
    async fn fetch_latest(&self, symbol: &str) -> Result<PriceRecord, FetchError> {
        CryptoCompareClient::fetch_latest(self, symbol).await
    }
}

/// Parse le corps d'une réponse histohour et construit le record
///
/// CONCEPT RUST : Ordre des vérifications
/// 1. JSON valide ?
/// 2. Response == "Success" ?
/// 3. Au moins 2 barres ?
/// 4. Timestamp convertible ?
pub fn parse_histohour(body: &str, timezone: &Tz) -> Result<PriceRecord, FetchError> {
    let response: HistoResponse = serde_json::from_str(body)?;

    if response.response != "Success" {
        let message = response
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or(response.response);
        return Err(FetchError::Upstream(message));
    }

    let bars: Vec<HourlyBar> = match response.data {
        serde_json::Value::Null => Vec::new(),
        data => serde_json::from_value(data)?,
    };

    if bars.len() < MIN_BARS {
        return Err(FetchError::InsufficientBars(bars.len()));
    }

    let latest = bars
        .last()
        .ok_or(FetchError::InsufficientBars(0))?;

    let utc: DateTime<Utc> =
        DateTime::from_timestamp(latest.time, 0).ok_or(FetchError::InvalidTimestamp(latest.time))?;
    let local = utc.with_timezone(timezone);

    Ok(PriceRecord::from_local(
        &local,
        latest.high,
        latest.low,
        latest.open,
        latest.close,
        latest.volumefrom,
        latest.volumeto,
    ))
}

// ============================================================================
// Tests unitaires
// ============================================================================

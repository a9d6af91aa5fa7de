// ============================================================================
// Configuration
// ============================================================================
// Toute la configuration vient de l'environnement (optionnellement d'un .env)
// et est construite une seule fois au démarrage, puis passée explicitement
// au relais. Aucun état global.
//
// CONCEPT : lookup injectable
// - from_env() lit std::env
// - from_lookup() prend une closure : les tests fournissent une HashMap
// ============================================================================

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;

use crate::models::SheetTarget;

pub const DEFAULT_BASE_ASSET: &str = "BTC";
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TOKEN_PATH: &str = "token.json";
pub const DEFAULT_CLIENT_SECRETS_PATH: &str = "credentials.json";
pub const DEFAULT_CRYPTOCOMPARE_URL: &str = "https://min-api.cryptocompare.com";
pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Réglages du credential, partagés par le service et l'outil d'autorisation
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSettings {
    /// Fichier token.json (lu, rafraîchi et réécrit en entier)
    pub token_path: PathBuf,

    /// Secrets du client OAuth (credentials.json), utilisés par `authorize`
    pub client_secrets_path: PathBuf,

    /// Port de la redirection loopback du flow interactif
    pub auth_port: u16,
}

impl AuthSettings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            token_path: lookup_or(&lookup, "TOKEN_PATH", DEFAULT_TOKEN_PATH).into(),
            client_secrets_path: lookup_or(
                &lookup,
                "CLIENT_SECRETS_PATH",
                DEFAULT_CLIENT_SECRETS_PATH,
            )
            .into(),
            auth_port: parse_or(&lookup, "AUTH_PORT", DEFAULT_PORT)?,
        })
    }
}

/// Configuration complète du service relais
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Identifiant de la feuille de calcul cible
    pub spreadsheet_id: String,

    /// Feuilles à mettre à jour, dans l'ordre de traitement
    pub targets: Vec<SheetTarget>,

    /// Actif de base (`fsym`)
    pub base_asset: String,

    /// Fuseau utilisé pour les colonnes date/heure
    pub timezone: Tz,

    /// Port d'écoute du trigger HTTP
    pub port: u16,

    pub crypto_compare_url: String,
    pub crypto_compare_api_key: Option<String>,
    pub fetch_timeout: Duration,

    pub sheets_api_url: String,

    /// Si défini, les logs sont aussi écrits dans ce répertoire (rotation quotidienne)
    pub log_dir: Option<PathBuf>,

    pub auth: AuthSettings,
}

impl Config {
    /// Charge la configuration depuis l'environnement (et .env s'il existe)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let spreadsheet_id = lookup("SPREADSHEET_ID")
            .filter(|s| !s.trim().is_empty())
            .context("SPREADSHEET_ID doit être défini")?;

        let targets = match lookup("RELAY_SHEETS") {
            Some(raw) => SheetTarget::parse_list(&raw)
                .map_err(|e| anyhow!("RELAY_SHEETS invalide : {}", e))?,
            None => SheetTarget::defaults(),
        };

        let timezone_name = lookup_or(&lookup, "RELAY_TIMEZONE", DEFAULT_TIMEZONE);
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow!("RELAY_TIMEZONE invalide ({}) : {}", timezone_name, e))?;

        let fetch_timeout_secs = parse_or(&lookup, "FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;

        Ok(Self {
            spreadsheet_id,
            targets,
            base_asset: lookup_or(&lookup, "BASE_ASSET", DEFAULT_BASE_ASSET),
            timezone,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            crypto_compare_url: lookup_or(&lookup, "CRYPTOCOMPARE_URL", DEFAULT_CRYPTOCOMPARE_URL),
            crypto_compare_api_key: lookup("CRYPTOCOMPARE_API_KEY").filter(|s| !s.is_empty()),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            sheets_api_url: lookup_or(&lookup, "SHEETS_API_URL", DEFAULT_SHEETS_API_URL),
            log_dir: lookup("LOG_DIR").filter(|s| !s.is_empty()).map(PathBuf::from),
            auth: AuthSettings::from_lookup(&lookup)?,
        })
    }
}

fn lookup_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} invalide ({}) : {}", key, raw, e)),
        None => Ok(default),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("SPREADSHEET_ID", "sheet-123")])).unwrap();

        assert_eq!(config.spreadsheet_id, "sheet-123");
        assert_eq!(config.targets, SheetTarget::defaults());
        assert_eq!(config.base_asset, "BTC");
        assert_eq!(config.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.port, 8080);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.crypto_compare_api_key, None);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.auth.token_path, PathBuf::from("token.json"));
        assert_eq!(config.auth.client_secrets_path, PathBuf::from("credentials.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SPREADSHEET_ID", "abc"),
            ("RELAY_SHEETS", "Dollar=USD,Yen=JPY"),
            ("RELAY_TIMEZONE", "Europe/Paris"),
            ("PORT", "9000"),
            ("FETCH_TIMEOUT_SECS", "3"),
            ("TOKEN_PATH", "/var/lib/relay/token.json"),
            ("CRYPTOCOMPARE_API_KEY", "key"),
        ]))
        .unwrap();

        assert_eq!(
            config.targets,
            vec![SheetTarget::new("Dollar", "USD"), SheetTarget::new("Yen", "JPY")]
        );
        assert_eq!(config.timezone, chrono_tz::Europe::Paris);
        assert_eq!(config.port, 9000);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.auth.token_path, PathBuf::from("/var/lib/relay/token.json"));
        assert_eq!(config.crypto_compare_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_missing_spreadsheet_id() {
        assert!(Config::from_lookup(lookup_from(&[])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SPREADSHEET_ID", "  ")])).is_err());
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup_from(&[
            ("SPREADSHEET_ID", "abc"),
            ("RELAY_TIMEZONE", "Mars/Olympus"),
        ]))
        .is_err());

        assert!(Config::from_lookup(lookup_from(&[
            ("SPREADSHEET_ID", "abc"),
            ("PORT", "http"),
        ]))
        .is_err());
    }
}

// ============================================================================
// Structure : Credential
// ============================================================================
// Token OAuth2 "authorized user" tel que Google le persiste dans token.json
//
// Le format des champs suit celui des librairies clientes Google
// (token, refresh_token, token_uri, client_id, client_secret, scopes, expiry)
// pour qu'un fichier produit par un autre outil Google se charge tel quel.
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// Scope demandé : lecture/écriture des feuilles de calcul
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Endpoint token par défaut de Google
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Marge avant l'expiry réelle à partir de laquelle le token est considéré expiré
/// (3 min 45 s, même seuil que les clients Google)
pub const REFRESH_THRESHOLD_SECS: i64 = 225;

/// Bundle de token OAuth2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Access token (Bearer)
    #[serde(default)]
    pub token: String,

    /// Refresh token, absent si le consentement n'a pas demandé l'accès offline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    /// Instant d'expiration de l'access token (None = pas d'expiration connue)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl Credential {
    /// Vrai si l'access token est (presque) expiré à l'instant `now`
    ///
    /// Un token sans expiry n'est jamais considéré expiré.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            // Expiry trop proche de la borne de chrono : considéré expiré
            Some(expiry) => match expiry.checked_sub_signed(Duration::seconds(REFRESH_THRESHOLD_SECS)) {
                Some(threshold) => now >= threshold,
                None => true,
            },
            None => false,
        }
    }

    /// Vrai si le token peut être utilisé tel quel
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && !self.is_expired(now)
    }

    /// Vrai si un refresh sans interaction utilisateur est possible
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Applique le résultat d'un refresh : nouveau token, nouvelle expiry
    ///
    /// CONCEPT RUST : self par valeur
    /// - Consomme l'ancien credential et en retourne un nouveau
    /// - Le refresh token est conservé si le serveur n'en renvoie pas
    ///
    /// Un `expires_in` négatif ou hors des bornes de chrono est refusé.
    pub fn refreshed(
        self,
        access_token: String,
        expires_in: Option<i64>,
        refresh_token: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, CredentialError> {
        let expiry = match expires_in {
            Some(secs) => Some(expiry_after(now, secs).ok_or_else(|| CredentialError::Rejected {
                error: "invalid_expires_in".to_string(),
                description: format!("expires_in hors limites : {}", secs),
            })?),
            None => None,
        };

        Ok(Self {
            token: access_token,
            refresh_token: refresh_token.or(self.refresh_token),
            expiry,
            ..self
        })
    }
}

/// `now + secs`, ou None si la durée n'est pas représentable
fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    if secs < 0 {
        return None;
    }
    Duration::try_seconds(secs).and_then(|delta| now.checked_add_signed(delta))
}

// ============================================================================
// Tests unitaires
// ============================================================================

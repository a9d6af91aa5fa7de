// ============================================================================
// Erreurs typées
// ============================================================================
// Une enum par couche, pour que l'appelant puisse décider quoi faire
// (sauter un symbole, conseiller une ré-authentification, ...)
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] implémente std::error::Error
// - #[error("...")] génère Display
// - #[from] génère From<T> pour utiliser ? directement
// ============================================================================

use thiserror::Error;

/// Message conseillé quand le refresh token n'est plus utilisable
pub const REAUTH_ADVICE: &str = "Token has been expired or revoked. Please re-authenticate.";

/// Erreurs du fetch de prix (CryptoCompare)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("requête HTTP échouée : {0}")]
    Transport(#[from] reqwest::Error),

    #[error("CryptoCompare a retourné HTTP {0}")]
    Status(u16),

    #[error("réponse JSON invalide : {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("CryptoCompare a signalé une erreur : {0}")]
    Upstream(String),

    #[error("pas assez de barres horaires ({0} reçue(s), 2 requises)")]
    InsufficientBars(usize),

    #[error("timestamp invalide : {0}")]
    InvalidTimestamp(i64),
}

impl FetchError {
    /// Vrai si l'API a répondu correctement mais sans barre exploitable
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::Upstream(_) | FetchError::InsufficientBars(_))
    }
}

/// Erreurs de l'API Google Sheets
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("requête HTTP échouée : {0}")]
    Transport(#[from] reqwest::Error),

    #[error("accès refusé par Google Sheets (HTTP {status}) : {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Google Sheets a rejeté la requête (HTTP {status}) : {message}")]
    Api { status: u16, message: String },

    #[error("réponse Google Sheets invalide : {0}")]
    Malformed(String),
}

impl SheetError {
    /// Vrai si Google indique un grant invalide (token expiré/révoqué)
    pub fn is_invalid_grant(&self) -> bool {
        match self {
            SheetError::Unauthorized { message, .. } | SheetError::Api { message, .. } => {
                message.contains("invalid_grant")
            }
            _ => false,
        }
    }
}

/// Erreurs du cycle de vie du credential OAuth2
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("lecture/écriture du token échouée ({path}) : {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fichier token illisible ({path}) : {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("requête OAuth2 échouée : {0}")]
    Transport(#[from] reqwest::Error),

    /// Refresh token expiré ou révoqué
    #[error("invalid_grant : {0}")]
    InvalidGrant(String),

    #[error("le serveur OAuth2 a refusé la requête ({error}) : {description}")]
    Rejected { error: String, description: String },

    /// Aucun credential utilisable et pas de flow interactif possible ici
    #[error("autorisation requise : {0}")]
    AuthorizationRequired(String),

    #[error("flow d'autorisation échoué : {0}")]
    Flow(String),
}

impl CredentialError {
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, CredentialError::InvalidGrant(_))
    }
}

/// Erreur d'une mise à jour de feuille : credential ou écriture
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

impl UpdateError {
    pub fn is_invalid_grant(&self) -> bool {
        match self {
            UpdateError::Credential(e) => e.is_invalid_grant(),
            UpdateError::Sheet(e) => e.is_invalid_grant(),
        }
    }
}

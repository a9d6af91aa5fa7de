// ============================================================================
// Structure : ClientSecrets
// ============================================================================
// Contenu de credentials.json téléchargé depuis la console Google Cloud
// (client OAuth de type "Desktop app" -> section "installed",
//  ou "Web application" -> section "web")
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::credential::GOOGLE_TOKEN_URI;

/// Endpoint de consentement par défaut de Google
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Identité du client OAuth
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,

    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Fichier complet : une seule des deux sections est présente
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse le JSON de credentials.json
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(json).context("credentials.json n'est pas un JSON valide")?;

        file.installed
            .or(file.web)
            .context("credentials.json ne contient ni section \"installed\" ni \"web\"")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_section() {
        let json = r#"{"installed": {
            "client_id": "123.apps.googleusercontent.com",
            "project_id": "relay",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_secret": "GOCSPX-abc",
            "redirect_uris": ["http://localhost"]
        }}"#;

        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret, "GOCSPX-abc");
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_web_section_with_defaults() {
        let json = r#"{"web": {"client_id": "id", "client_secret": "secret"}}"#;

        let secrets = ClientSecrets::from_json(json).unwrap();
        assert_eq!(secrets.auth_uri, GOOGLE_AUTH_URI);
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_missing_section() {
        assert!(ClientSecrets::from_json(r#"{"other": {}}"#).is_err());
    }
}

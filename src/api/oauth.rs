// ============================================================================
// API Client : endpoint token OAuth2
// ============================================================================
// Deux grants utilisés :
// - refresh_token      : renouvelle l'access token sans interaction
// - authorization_code : échange le code reçu après consentement (outil authorize)
//
// Les requêtes sont des POST application/x-www-form-urlencoded
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::auth::TokenRefresher;
use crate::error::CredentialError;
use crate::models::client_secrets::ClientSecrets;
use crate::models::credential::SPREADSHEETS_SCOPE;
use crate::models::Credential;

/// Réponse de succès de l'endpoint token
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Réponse d'erreur (RFC 6749 §5.2)
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client de l'endpoint token
#[derive(Debug, Clone, Default)]
pub struct OAuthClient {
    client: reqwest::Client,
}

impl OAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// POST d'un formulaire sur `token_uri`, avec mapping des erreurs OAuth2
    async fn post_token(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, CredentialError> {
        let response = self.client.post(token_uri).form(form).send().await?;
        let status = response.status();
        debug!(status = %status, "Token endpoint answered");

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let (error, description) = match serde_json::from_str::<OAuthErrorBody>(&body) {
            Ok(parsed) => (parsed.error, parsed.error_description.unwrap_or_default()),
            Err(_) => (format!("http_{}", status.as_u16()), body),
        };

        warn!(error = %error, description = %description, "Token request rejected");

        if error == "invalid_grant" {
            Err(CredentialError::InvalidGrant(description))
        } else {
            Err(CredentialError::Rejected { error, description })
        }
    }

    /// Renouvelle l'access token à partir du refresh token
    #[instrument(skip(self, credential), fields(token_uri = %credential.token_uri))]
    pub async fn refresh_credential(&self, credential: Credential) -> Result<Credential, CredentialError> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CredentialError::AuthorizationRequired("pas de refresh token".to_string()))?;

        let token = self
            .post_token(
                &credential.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", credential.client_id.as_str()),
                    ("client_secret", credential.client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                ],
            )
            .await?;

        let mut refreshed =
            credential.refreshed(token.access_token, token.expires_in, token.refresh_token, Utc::now())?;
        info!(expires_in = ?token.expires_in, "Access token refreshed");
        if let Some(scope) = token.scope {
            refreshed.scopes = split_scopes(&scope);
        }
        Ok(refreshed)
    }

    /// Échange un code d'autorisation contre un credential complet
    #[instrument(skip(self, secrets, code))]
    pub async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credential, CredentialError> {
        let token = self
            .post_token(
                &secrets.token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                    ("redirect_uri", redirect_uri),
                ],
            )
            .await?;

        if token.refresh_token.is_none() {
            warn!("No refresh token issued: the service will not be able to refresh this credential");
        }

        let scopes = token
            .scope
            .as_deref()
            .map(split_scopes)
            .unwrap_or_else(|| vec![SPREADSHEETS_SCOPE.to_string()]);

        let blank = Credential {
            token: String::new(),
            refresh_token: None,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes,
            expiry: None,
        };

        let credential = blank.refreshed(token.access_token, token.expires_in, token.refresh_token, Utc::now())?;
        info!("Authorization code exchanged");
        Ok(credential)
    }
}

#[async_trait]
impl TokenRefresher for OAuthClient {
    async fn refresh(&self, credential: Credential) -> Result<Credential, CredentialError> {
        self.refresh_credential(credential).await
    }
}

fn split_scopes(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(str::to_string).collect()
}

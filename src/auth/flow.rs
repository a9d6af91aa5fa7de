// ============================================================================
// Flows d'autorisation
// ============================================================================
// - InstalledAppFlow    : flow "installed app" avec redirection loopback,
//                         lancé hors-ligne par l'outil `authorize`
// - OutOfBandAuthorizer : utilisé par le service ; ne peut pas ouvrir de
//                         navigateur, il refuse avec un conseil
//
// CONCEPT : Redirection loopback
// 1. On écoute sur 127.0.0.1:<port>
// 2. L'utilisateur ouvre l'URL de consentement et accepte
// 3. Google redirige le navigateur vers http://127.0.0.1:<port>/?code=...&state=...
// 4. On échange le code contre un token
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Url;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

use crate::api::OAuthClient;
use crate::auth::Authorizer;
use crate::error::CredentialError;
use crate::models::credential::SPREADSHEETS_SCOPE;
use crate::models::{ClientSecrets, Credential};

/// Longueur du paramètre anti-CSRF "state"
const STATE_LEN: usize = 30;

/// Page affichée dans le navigateur après la redirection
const CALLBACK_PAGE: &str = "The authentication flow has completed. You may close this window.";

// ============================================================================
// OutOfBandAuthorizer
// ============================================================================

/// Authorizer du service : pas d'interaction possible, on conseille l'outil
#[derive(Debug, Clone)]
pub struct OutOfBandAuthorizer {
    token_path: PathBuf,
}

impl OutOfBandAuthorizer {
    pub fn new(token_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
        }
    }
}

#[async_trait]
impl Authorizer for OutOfBandAuthorizer {
    async fn authorize(&self) -> Result<Credential, CredentialError> {
        Err(CredentialError::AuthorizationRequired(format!(
            "aucun token utilisable dans {} ; lancer le binaire `authorize` pour le (re)générer",
            self.token_path.display()
        )))
    }
}

// ============================================================================
// LoopbackReceiver : réception du code d'autorisation
// ============================================================================

/// Paramètres de la redirection
#[derive(Debug, Clone, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Listener loopback déjà lié, prêt à recevoir une redirection
pub struct LoopbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackReceiver {
    /// Lie 127.0.0.1:`port` (0 = port choisi par l'OS)
    pub async fn bind(port: u16) -> Result<Self, CredentialError> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| CredentialError::Flow(format!("impossible d'écouter sur le port {} : {}", port, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| CredentialError::Flow(e.to_string()))?;

        Ok(Self { listener, addr })
    }

    /// URI à enregistrer comme redirect_uri
    pub fn redirect_uri(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Attend une redirection et retourne le code
    ///
    /// CONCEPT RUST : Channels tokio
    /// - mpsc : le handler axum pousse les paramètres reçus
    /// - oneshot : signale l'arrêt gracieux du serveur une fois le code reçu
    pub async fn wait_for_code(self, expected_state: &str) -> Result<String, CredentialError> {
        let (params_tx, mut params_rx) = mpsc::channel::<CallbackParams>(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new()
            .route("/", get(callback_handler))
            .with_state(params_tx);

        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let params = params_rx.recv().await;
        let _ = shutdown_tx.send(());
        let _ = server.await;

        let params = params.ok_or_else(|| CredentialError::Flow("redirection jamais reçue".to_string()))?;
        debug!(has_code = params.code.is_some(), "Redirect received");

        if let Some(error) = params.error {
            return Err(CredentialError::Flow(format!("consentement refusé : {}", error)));
        }
        if params.state.as_deref() != Some(expected_state) {
            return Err(CredentialError::Flow("paramètre state inattendu (CSRF ?)".to_string()));
        }
        params
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CredentialError::Flow("redirection sans code".to_string()))
    }
}

async fn callback_handler(
    State(params_tx): State<mpsc::Sender<CallbackParams>>,
    Query(params): Query<CallbackParams>,
) -> &'static str {
    let _ = params_tx.send(params).await;
    CALLBACK_PAGE
}

// ============================================================================
// InstalledAppFlow
// ============================================================================

/// Flow interactif complet : URL de consentement, redirection, échange du code
pub struct InstalledAppFlow {
    secrets: ClientSecrets,
    port: u16,
    scopes: Vec<String>,
    oauth: OAuthClient,
}

impl InstalledAppFlow {
    pub fn new(secrets: ClientSecrets, port: u16) -> Self {
        Self {
            secrets,
            port,
            scopes: vec![SPREADSHEETS_SCOPE.to_string()],
            oauth: OAuthClient::new(),
        }
    }

    /// Construit l'URL à ouvrir dans le navigateur
    pub fn consent_url(&self, redirect_uri: &str, state: &str) -> Result<Url, CredentialError> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| CredentialError::Flow(format!("auth_uri invalide : {}", e)))
    }
}

#[async_trait]
impl Authorizer for InstalledAppFlow {
    #[instrument(skip(self), fields(port = self.port))]
    async fn authorize(&self) -> Result<Credential, CredentialError> {
        let receiver = LoopbackReceiver::bind(self.port).await?;
        let redirect_uri = receiver.redirect_uri();
        let state = random_state();

        let url = self.consent_url(&redirect_uri, &state)?;
        info!(redirect_uri = %redirect_uri, "Waiting for user consent");
        println!("Ouvrez cette URL dans votre navigateur pour autoriser l'accès :\n\n{}\n", url);

        let code = receiver.wait_for_code(&state).await?;
        self.oauth.exchange_code(&self.secrets, &code, &redirect_uri).await
    }
}

/// Chaîne aléatoire alphanumérique pour le paramètre state
fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

// ============================================================================
// Tests unitaires
// ============================================================================

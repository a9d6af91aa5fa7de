// ============================================================================
// Module : auth
// ============================================================================
// Cycle de vie du credential OAuth2 :
// chargé -> validé -> rafraîchi si possible -> sinon ré-autorisé -> persisté
//
// Trois coutures (traits) pour pouvoir tester sans Google :
// - CredentialStore : où vit le token (fichier token.json en prod)
// - TokenRefresher  : grant refresh_token
// - Authorizer      : obtention d'un credential neuf (flow complet)
// ============================================================================

pub mod flow;    // Flow interactif loopback + refus hors-ligne
pub mod manager; // Algorithme d'acquisition
pub mod store;   // Persistance fichier

use async_trait::async_trait;

use crate::error::CredentialError;
use crate::models::Credential;

pub use flow::{InstalledAppFlow, LoopbackReceiver, OutOfBandAuthorizer};
pub use manager::{Acquired, CredentialManager, CredentialSource};
pub use store::FileCredentialStore;

/// Stockage opaque d'un bundle de token
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// None si aucun credential n'a encore été persisté
    async fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Remplace entièrement le credential persisté
    async fn save(&self, credential: &Credential) -> Result<(), CredentialError>;
}

/// Renouvellement d'un access token via le refresh token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credential: Credential) -> Result<Credential, CredentialError>;
}

/// Obtention d'un credential neuf, sans rien réutiliser
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> Result<Credential, CredentialError>;
}

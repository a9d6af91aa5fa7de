// ============================================================================
// CredentialManager : algorithme d'acquisition du credential
// ============================================================================
// 1. Si un credential est persisté, le charger
// 2. S'il n'y en a pas, ou s'il n'est pas valide :
//    - expiré ET refresh token présent -> refresh en place
//    - sinon                           -> flow d'autorisation complet
// 3. Si l'étape 2 a produit un credential, le persister avant de continuer
//
// Un credential présent et valide est réutilisé tel quel : ni refresh,
// ni flow, ni écriture.
// ============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::auth::{Authorizer, CredentialStore, TokenRefresher};
use crate::error::CredentialError;
use crate::models::Credential;

/// D'où vient le credential retourné
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Chargé et encore valide
    Reused,
    /// Expiré, renouvelé avec le refresh token
    Refreshed,
    /// Obtenu par le flow d'autorisation
    Authorized,
}

/// Credential prêt à l'emploi
#[derive(Debug, Clone)]
pub struct Acquired {
    pub credential: Credential,
    pub source: CredentialSource,
}

impl Acquired {
    pub fn access_token(&self) -> &str {
        &self.credential.token
    }
}

/// Orchestration store + refresh + flow
///
/// CONCEPT RUST : Arc<dyn Trait>
/// - Les dépendances sont injectées à la construction
/// - Arc : partageables entre le serveur et l'outil sans copie
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    authorizer: Arc<dyn Authorizer>,
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            store,
            refresher,
            authorizer,
        }
    }

    /// Retourne un credential valide, en le rafraîchissant ou en le
    /// ré-obtenant si nécessaire
    pub async fn acquire(&self) -> Result<Acquired, CredentialError> {
        self.acquire_at(Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn acquire_at(&self, now: DateTime<Utc>) -> Result<Acquired, CredentialError> {
        let loaded = self.store.load().await?;

        let (credential, source) = match loaded {
            Some(credential) if credential.is_valid(now) => {
                return Ok(Acquired {
                    credential,
                    source: CredentialSource::Reused,
                });
            }
            Some(credential) if credential.is_expired(now) && credential.can_refresh() => {
                info!("Credential expired, refreshing");
                let refreshed = self.refresher.refresh(credential).await?;
                (refreshed, CredentialSource::Refreshed)
            }
            other => {
                if other.is_some() {
                    warn!("Credential unusable and not refreshable, starting authorization");
                } else {
                    info!("No credential persisted, starting authorization");
                }
                let authorized = self.authorizer.authorize().await?;
                (authorized, CredentialSource::Authorized)
            }
        };

        self.store.save(&credential).await?;
        info!(source = ?source, "Credential persisted");

        Ok(Acquired { credential, source })
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

// ============================================================================
// FileCredentialStore : token.json sur disque
// ============================================================================
// - load : fichier absent => None (premier lancement)
// - save : écrit un fichier temporaire puis rename => jamais de token tronqué
// ============================================================================

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::auth::CredentialStore;
use crate::error::CredentialError;
use crate::models::Credential;

/// Credential persisté dans un fichier JSON
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted credential");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let credential = serde_json::from_str(&json).map_err(|source| CredentialError::Format {
            path: self.path.display().to_string(),
            source,
        })?;

        debug!(path = %self.path.display(), "Credential loaded");
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        let json = serde_json::to_string_pretty(credential).map_err(|source| CredentialError::Format {
            path: self.path.display().to_string(),
            source,
        })?;

        // Écriture atomique : fichier voisin puis rename
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await.map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }
}

// ============================================================================
// Serveur HTTP : le trigger
// ============================================================================
// POST / (corps ignoré) -> exécute une invocation du relais -> 200 "Completed"
//
// La réponse est toujours 200 "Completed", quel que soit le nombre de
// symboles mis à jour. Le détail est dans les logs et dans le header
// x-relay-updated ("mises à jour/total").
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::relay::Relay;

/// Corps de la réponse du trigger
pub const COMPLETED: &str = "Completed";

/// Header portant le résumé "mises à jour/total"
pub const SUMMARY_HEADER: &str = "x-relay-updated";

/// État partagé entre les requêtes
///
/// CONCEPT : Une invocation à la fois
/// - Deux triggers simultanés calculeraient la même "prochaine ligne"
///   et réécriraient token.json en parallèle
/// - Le Mutex tokio sérialise les invocations dans ce process
#[derive(Clone)]
pub struct AppState {
    relay: Arc<Relay>,
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Construit le routeur du trigger
pub fn router(relay: Relay) -> Router {
    Router::new()
        .route("/", post(trigger_handler))
        .with_state(AppState::new(relay))
}

/// POST / : une invocation complète du relais
async fn trigger_handler(State(state): State<AppState>) -> impl IntoResponse {
    let _guard = state.run_lock.lock().await;
    debug!("Trigger received");

    let report = state.relay.run().await;
    info!(summary = %report.summary(), all_updated = report.all_updated(), "Trigger completed");

    (StatusCode::OK, [(SUMMARY_HEADER, report.summary())], COMPLETED)
}

/// Sert le trigger jusqu'à Ctrl+C (SIGINT) ou SIGTERM
pub async fn serve(relay: Relay, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Impossible d'écouter sur {}", addr))?;

    serve_until(listener, relay, shutdown_signal()).await
}

/// Sert le trigger sur un listener déjà lié jusqu'à ce que `shutdown` se termine
///
/// Une invocation en cours va jusqu'au bout avant l'arrêt.
pub async fn serve_until<F>(listener: TcpListener, relay: Relay, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .context("Adresse du listener introuvable")?;
    info!(%addr, "Server listening");
    info!("  POST / -> relay run");

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Le serveur HTTP s'est arrêté sur une erreur")?;

    info!("Server stopped");
    Ok(())
}

/// Se termine au premier Ctrl+C ou SIGTERM (arrêt par un scheduler ou un conteneur)
///
/// CONCEPT RUST : tokio::select!
/// - Attend plusieurs futures, garde la première qui se termine
/// - Un signal impossible à écouter devient une future qui ne finit jamais
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}

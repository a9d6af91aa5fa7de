// ============================================================================
// Pricesheet - Library
// ============================================================================
// Relais horaire : dernière barre CryptoCompare -> nouvelle ligne Google Sheets
// Expose les modules publics pour les binaires et les tests d'intégration
// ============================================================================

pub mod api;     // Clients CryptoCompare, Google Sheets, OAuth2
pub mod auth;    // Cycle de vie du credential OAuth2
pub mod config;  // Configuration depuis l'environnement
pub mod error;   // Erreurs typées par couche
pub mod logging; // Initialisation de tracing
pub mod models;  // Structures de données
pub mod relay;   // Boucle du trigger et mise à jour des feuilles
pub mod server;  // Serveur HTTP (POST /)

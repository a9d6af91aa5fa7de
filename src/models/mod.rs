// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données du relais
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module public (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod client_secrets; // Identité du client OAuth (credentials.json)
pub mod credential;   // Token OAuth2 persisté (token.json)
pub mod price_record; // Barre horaire aplatie en une ligne de feuille
pub mod report;       // Résultats typés d'une invocation
pub mod sheet_target; // Paire feuille -> symbole

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use pricesheet::models::price_record::PriceRecord;
// On peut faire : use pricesheet::models::PriceRecord;
pub use client_secrets::ClientSecrets;
pub use credential::Credential;
pub use price_record::PriceRecord;
pub use report::{FailureKind, ReportEntry, RunReport, SymbolOutcome};
pub use sheet_target::SheetTarget;

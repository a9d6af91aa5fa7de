// ============================================================================
// Structures : SymbolOutcome / RunReport
// ============================================================================
// Résultat typé d'une invocation du trigger, symbole par symbole
//
// CONCEPT : Agréger au lieu de logger seulement
// - Chaque symbole produit exactement un SymbolOutcome
// - Le RunReport garde l'ordre du mapping
// - L'appelant peut compter les succès sans parser les logs
// ============================================================================

/// Catégorie d'un échec d'écriture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Impossible d'obtenir un credential (fichier absent, refresh refusé, ...)
    Credential,

    /// Refresh token expiré ou révoqué : ré-authentification manuelle requise
    InvalidGrant,

    /// Lecture de la colonne ou écriture de la ligne rejetée
    Write,
}

/// Ce qui est arrivé à un symbole pendant une invocation
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    /// Ligne écrite
    Updated { row: u32, cells: u64 },

    /// Pas de données de prix : rien à écrire
    Skipped { reason: String },

    /// Données récupérées mais l'écriture a échoué
    Failed { kind: FailureKind, reason: String },
}

impl SymbolOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, SymbolOutcome::Updated { .. })
    }
}

/// Une entrée du rapport : feuille, symbole, résultat
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub sheet: String,
    pub symbol: String,
    pub outcome: SymbolOutcome,
}

/// Rapport complet d'une invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: &str, symbol: &str, outcome: SymbolOutcome) {
        self.entries.push(ReportEntry {
            sheet: sheet.to_string(),
            symbol: symbol.to_string(),
            outcome,
        });
    }

    /// Nombre de feuilles effectivement mises à jour
    pub fn updated(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_updated()).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, SymbolOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, SymbolOutcome::Failed { .. }))
            .count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn all_updated(&self) -> bool {
        self.updated() == self.total()
    }

    /// Résultat pour une feuille donnée
    pub fn outcome_for(&self, sheet: &str) -> Option<&SymbolOutcome> {
        self.entries
            .iter()
            .find(|e| e.sheet == sheet)
            .map(|e| &e.outcome)
    }

    /// Résumé court "mises à jour/total" (ex: "2/3")
    pub fn summary(&self) -> String {
        format!("{}/{}", self.updated(), self.total())
    }
}

// ============================================================================
// Structure : SheetTarget
// ============================================================================
// Une paire (nom de feuille -> symbole) du mapping fixe
// ============================================================================

use std::fmt;
use std::str::FromStr;


/// Feuille de destination et symbole coté à y écrire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    /// Nom de l'onglet (ex: "USDC")
    pub sheet: String,

    /// Symbole passé en `tsym` à l'API (ex: "USDC")
    pub symbol: String,
}

impl SheetTarget {
    pub fn new(sheet: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            symbol: symbol.into(),
        }
    }

    /// Mapping par défaut, dans l'ordre de traitement
    pub fn defaults() -> Vec<SheetTarget> {
        vec![
            SheetTarget::new("USDC", "USDC"),
            SheetTarget::new("JPY", "JPY"),
            SheetTarget::new("USD", "USD"),
        ]
    }

    /// Parse une liste "feuille=symbole,feuille=symbole"
    ///
    /// L'ordre de la chaîne est l'ordre de traitement.
    pub fn parse_list(input: &str) -> Result<Vec<SheetTarget>, String> {
        let targets = input
            .split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .map(SheetTarget::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        if targets.is_empty() {
            return Err("empty sheet mapping".to_string());
        }
        Ok(targets)
    }
}

impl FromStr for SheetTarget {
    type Err = String;

    /// "USDC=USDC" ou "USDC" (feuille et symbole identiques)
    fn from_str(pair: &str) -> Result<Self, Self::Err> {
        let (sheet, symbol) = match pair.split_once('=') {
            Some((sheet, symbol)) => (sheet.trim(), symbol.trim()),
            None => (pair.trim(), pair.trim()),
        };

        if sheet.is_empty() || symbol.is_empty() {
            return Err(format!("invalid sheet mapping entry: {:?}", pair));
        }
        Ok(SheetTarget::new(sheet, symbol))
    }
}

impl fmt::Display for SheetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.sheet, self.symbol)
    }
}

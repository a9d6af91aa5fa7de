// ============================================================================
// Structure : PriceRecord
// ============================================================================
// Une barre horaire (OHLCV) aplatie, prête à être écrite comme une ligne
// de la feuille de calcul
//
// CONCEPTS RUST :
// 1. Value object : créé une fois, jamais modifié (pas de &mut self)
// 2. DateTime<Tz> : chrono + chrono-tz pour passer de l'UTC à l'heure locale
// 3. serde_json::Value : cellules hétérogènes (texte + nombres)
// ============================================================================

use chrono::{DateTime, TimeZone};
use serde_json::Value;

/// Format de la colonne date (A)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format de la colonne heure (B)
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Nombre de colonnes écrites par ligne
pub const ROW_WIDTH: usize = 8;

/// Dernière barre horaire d'un symbole, dans le fuseau configuré
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    /// Date locale (ex: "2024-05-01")
    pub date: String,

    /// Heure locale (ex: "09:00:00")
    pub time: String,

    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,

    /// Volume dans l'actif de base (BTC)
    pub volumefrom: f64,

    /// Volume dans la devise cotée
    pub volumeto: f64,
}

impl PriceRecord {
    /// Construit un record à partir d'un instant déjà converti dans le fuseau cible
    ///
    /// CONCEPT RUST : Générique sur le fuseau
    /// - `Tz: TimeZone` accepte Utc, FixedOffset ou chrono_tz::Tz
    /// - `Tz::Offset: Display` est requis par `format()`
    pub fn from_local<Tz>(
        at: &DateTime<Tz>,
        high: f64,
        low: f64,
        open: f64,
        close: f64,
        volumefrom: f64,
        volumeto: f64,
    ) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            date: at.format(DATE_FORMAT).to_string(),
            time: at.format(TIME_FORMAT).to_string(),
            high,
            low,
            open,
            close,
            volumefrom,
            volumeto,
        }
    }

    /// Retourne la ligne à écrire, dans l'ordre fixe des colonnes :
    /// date, heure, high, low, open, close, volumefrom, volumeto
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.date.as_str()),
            Value::from(self.time.as_str()),
            Value::from(self.high),
            Value::from(self.low),
            Value::from(self.open),
            Value::from(self.close),
            Value::from(self.volumefrom),
            Value::from(self.volumeto),
        ]
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_from_local_splits_date_and_time() {
        let at = Utc
            .timestamp_opt(1_714_521_600, 0)
            .unwrap()
            .with_timezone(&chrono_tz::Asia::Tokyo);

        // 2024-05-01 00:00:00 UTC -> 09:00 à Tokyo
        let record = PriceRecord::from_local(&at, 2.0, 1.0, 1.5, 1.8, 10.0, 20.0);
        assert_eq!(record.date, "2024-05-01");
        assert_eq!(record.time, "09:00:00");
    }

    #[test]
    fn test_to_row_column_order() {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        let record = PriceRecord::from_local(&at, 4.0, 1.0, 2.0, 3.0, 5.0, 6.0);

        let row = record.to_row();
        assert_eq!(row.len(), ROW_WIDTH);
        assert_eq!(row[0], Value::from("1970-01-01"));
        assert_eq!(row[1], Value::from("00:00:00"));
        assert_eq!(row[2], Value::from(4.0)); // high
        assert_eq!(row[3], Value::from(1.0)); // low
        assert_eq!(row[4], Value::from(2.0)); // open
        assert_eq!(row[5], Value::from(3.0)); // close
        assert_eq!(row[6], Value::from(5.0)); // volumefrom
        assert_eq!(row[7], Value::from(6.0)); // volumeto
    }
}

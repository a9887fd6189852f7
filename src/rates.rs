use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Rate;

/// annual interest rate per loan category
///
/// Lookups are total: anything not configured, including an empty category,
/// resolves to `default_rate`. Keys are stored trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(deserialize_with = "normalized_keys")]
    rates: BTreeMap<String, Rate>,
    default_rate: Rate,
}

impl RateTable {
    /// empty table that answers every category with `default_rate`
    pub fn new(default_rate: Rate) -> Self {
        Self {
            rates: BTreeMap::new(),
            default_rate,
        }
    }

    /// home 8%, car 9%, gold 7%, anything else 10%
    pub fn standard() -> Self {
        Self::new(Rate::from_percentage(10))
            .with_rate("home", Rate::from_decimal(dec!(0.08)))
            .with_rate("car", Rate::from_decimal(dec!(0.09)))
            .with_rate("gold", Rate::from_decimal(dec!(0.07)))
    }

    pub fn with_rate(mut self, category: &str, rate: Rate) -> Self {
        self.rates.insert(normalize(category), rate);
        self
    }

    pub fn rate_for(&self, category: &str) -> Rate {
        self.rates
            .get(&normalize(category))
            .copied()
            .unwrap_or(self.default_rate)
    }

    pub fn default_rate(&self) -> Rate {
        self.default_rate
    }

    pub fn is_known(&self, category: &str) -> bool {
        self.rates.contains_key(&normalize(category))
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, Rate)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub(crate) fn has_negative_rate(&self) -> bool {
        self.default_rate.is_negative() || self.rates.values().any(Rate::is_negative)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize(category: &str) -> String {
    category.trim().to_ascii_lowercase()
}

fn normalized_keys<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, Rate>, D::Error> {
    let raw = BTreeMap::<String, Rate>::deserialize(d)?;
    Ok(raw.into_iter().map(|(k, v)| (normalize(&k), v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories() {
        let table = RateTable::standard();
        assert_eq!(table.rate_for("home").as_decimal(), dec!(0.08));
        assert_eq!(table.rate_for("car").as_decimal(), dec!(0.09));
        assert_eq!(table.rate_for("gold").as_decimal(), dec!(0.07));
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let table = RateTable::standard();
        assert_eq!(table.rate_for("boat").as_decimal(), dec!(0.10));
        assert_eq!(table.rate_for("").as_decimal(), dec!(0.10));
        assert_eq!(table.rate_for("   ").as_decimal(), dec!(0.10));
        assert!(!table.is_known("boat"));
    }

    #[test]
    fn test_lookup_ignores_case_and_padding() {
        let table = RateTable::standard();
        assert_eq!(table.rate_for(" Home "), table.rate_for("home"));
        assert!(table.is_known("GOLD"));
    }

    #[test]
    fn test_custom_table() {
        let table = RateTable::new(Rate::from_percentage(12))
            .with_rate("Education", Rate::from_bps(550));

        assert_eq!(table.rate_for("education"), Rate::from_bps(550));
        assert_eq!(table.rate_for("home"), Rate::from_percentage(12));

        let categories: Vec<_> = table.categories().collect();
        assert_eq!(categories, vec![("education", Rate::from_bps(550))]);
    }

    #[test]
    fn test_negative_rate_detection() {
        assert!(!RateTable::standard().has_negative_rate());
        let bad = RateTable::standard().with_rate("promo", Rate::from_decimal(dec!(-0.01)));
        assert!(bad.has_negative_rate());
    }

    #[test]
    fn test_deserialized_keys_are_normalized() {
        let json = r#"{"rates": {" Home ": "0.05"}, "default_rate": "0.1"}"#;
        let table: RateTable = serde_json::from_str(json).unwrap();
        assert!(table.is_known("home"));
        assert_eq!(table.rate_for("HOME").as_decimal(), dec!(0.05));
    }
}

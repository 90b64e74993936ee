//! Canonical price payload.
//!
//! Rates are filtered by whitelist membership and sorted by denom, so the
//! same snapshot always encodes to the same string regardless of the order
//! the reference chain returned it in.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::blockchain::types::ExchangeRate;

/// Comma-separated `amount+denom` pairs, e.g. `1.5ukrw,0.0012uusd`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PricePayload(String);

impl PricePayload {
    /// Build a payload from the rates whose denom is whitelisted.
    ///
    /// When a denom appears more than once the first occurrence wins.
    pub fn build(rates: &[ExchangeRate], whitelist: &BTreeSet<&str>) -> Self {
        let mut selected: BTreeMap<&str, &str> = BTreeMap::new();
        for rate in rates {
            if whitelist.contains(rate.denom.as_str()) {
                selected.entry(rate.denom.as_str()).or_insert(rate.amount.as_str());
            }
        }

        let encoded = selected
            .into_iter()
            .map(|(denom, amount)| format!("{}{}", amount, denom))
            .collect::<Vec<_>>()
            .join(",");
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of `amount+denom` pairs.
    pub fn len(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.split(',').count()
        }
    }
}

impl fmt::Display for PricePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

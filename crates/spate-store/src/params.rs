//! Runtime-tunable production parameters.
//!
//! `amount` and `variation` are read together by every producer tick and
//! replaced together by configuration requests, so they share one lock.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::dice::Dice;

/// Default fixed units added per production tick.
pub const DEFAULT_AMOUNT: u32 = 5;

/// Default upper bound of the random units added on top of `amount`.
pub const DEFAULT_VARIATION: u32 = 1;

/// One consistent view of the production parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductionSettings {
    pub amount: u32,
    pub variation: u32,
}

impl Default for ProductionSettings {
    fn default() -> Self {
        Self {
            amount: DEFAULT_AMOUNT,
            variation: DEFAULT_VARIATION,
        }
    }
}

impl ProductionSettings {
    /// Units to add for one tick: `amount + uniform(0..=variation)`.
    pub fn draw_delta(&self, dice: &dyn Dice) -> u64 {
        u64::from(self.amount) + dice.roll(u64::from(self.variation))
    }
}

/// Shared, mutable production parameters.
#[derive(Debug, Default)]
pub struct ProductionParameters {
    inner: Mutex<ProductionSettings>,
}

impl ProductionParameters {
    pub fn new(settings: ProductionSettings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }

    pub fn get(&self) -> ProductionSettings {
        *self.inner.lock()
    }

    /// Replace the given fields in one step. `None` keeps the current value.
    pub fn update(&self, amount: Option<u32>, variation: Option<u32>) -> ProductionSettings {
        let mut settings = self.inner.lock();
        if let Some(amount) = amount {
            settings.amount = amount;
        }
        if let Some(variation) = variation {
            settings.variation = variation;
        }
        let updated = *settings;
        drop(settings);

        if amount.is_some() || variation.is_some() {
            info!(
                amount = updated.amount,
                variation = updated.variation,
                "production parameters updated"
            );
        }
        updated
    }

    /// Apply raw (unparsed) request values.
    ///
    /// Each field is parsed on its own; a missing, negative, or non-numeric
    /// field is ignored and the previous value stays.
    pub fn apply_raw(&self, amount: Option<&str>, variation: Option<&str>) -> ProductionSettings {
        let amount = parse_field("amount", amount);
        let variation = parse_field("variation", variation);
        self.update(amount, variation)
    }
}

fn parse_field(name: &str, raw: Option<&str>) -> Option<u32> {
    let raw = raw?;
    match raw.trim().parse::<u32>() {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(field = name, value = raw, error = %e, "ignoring unparsable parameter");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MaxDice;

    impl Dice for MaxDice {
        fn roll(&self, max: u64) -> u64 {
            max
        }
    }

    #[test]
    fn defaults() {
        let params = ProductionParameters::default();
        assert_eq!(params.get(), ProductionSettings { amount: 5, variation: 1 });
    }

    #[test]
    fn update_both_fields() {
        let params = ProductionParameters::default();
        let updated = params.update(Some(10), Some(0));
        assert_eq!(updated, ProductionSettings { amount: 10, variation: 0 });
        assert_eq!(params.get(), updated);
    }

    #[test]
    fn update_single_field_keeps_other() {
        let params = ProductionParameters::default();
        params.update(None, Some(4));
        assert_eq!(params.get(), ProductionSettings { amount: 5, variation: 4 });
    }

    #[test]
    fn apply_raw_parses_numbers() {
        let params = ProductionParameters::default();
        let updated = params.apply_raw(Some("10"), Some(" 3 "));
        assert_eq!(updated, ProductionSettings { amount: 10, variation: 3 });
    }

    #[test]
    fn apply_raw_ignores_garbage_per_field() {
        let params = ProductionParameters::new(ProductionSettings { amount: 8, variation: 2 });

        let updated = params.apply_raw(Some("abc"), Some("6"));
        assert_eq!(updated, ProductionSettings { amount: 8, variation: 6 });

        let updated = params.apply_raw(Some("-3"), Some(""));
        assert_eq!(updated, ProductionSettings { amount: 8, variation: 6 });
    }

    #[test]
    fn apply_raw_missing_fields() {
        let params = ProductionParameters::default();
        let updated = params.apply_raw(None, None);
        assert_eq!(updated, ProductionSettings::default());
    }

    #[test]
    fn draw_delta_bounds() {
        let settings = ProductionSettings { amount: 10, variation: 0 };
        assert_eq!(settings.draw_delta(&MaxDice), 10);

        let settings = ProductionSettings { amount: 5, variation: 3 };
        assert_eq!(settings.draw_delta(&MaxDice), 8);
    }
}

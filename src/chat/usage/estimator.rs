//! Usage and cost estimation for one request/response pair.
//!
//! Estimates are informational only; nothing here gates a request.

use serde::{Deserialize, Serialize};

use crate::chat::usage::tokenizer::TokenCounter;

/// Units per pricing block.
const UNITS_PER_RATE: f64 = 1000.0;

/// Currency rates per 1000 units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    /// Rate for units sent to the model.
    pub input_per_1k: f64,
    /// Rate for units produced by the model.
    pub output_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_1k: 0.0015,
            output_per_1k: 0.002,
        }
    }
}

impl Pricing {
    /// Estimate with these rates.
    #[must_use]
    pub fn estimate(
        &self,
        counter: &dyn TokenCounter,
        input_text: &str,
        output_text: &str,
    ) -> UsageEstimate {
        estimate(
            counter,
            input_text,
            output_text,
            self.input_per_1k,
            self.output_per_1k,
        )
    }
}

/// Derived usage for a single turn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageEstimate {
    /// Units in the input text.
    pub input_units: usize,
    /// Units in the output text.
    pub output_units: usize,
    /// Estimated input cost.
    pub input_cost: f64,
    /// Estimated output cost.
    pub output_cost: f64,
    /// Sum of input and output cost.
    pub total_cost: f64,
}

impl UsageEstimate {
    /// Estimate from already-counted units.
    #[must_use]
    pub fn from_counts(
        input_units: usize,
        output_units: usize,
        rate_in_per_1k: f64,
        rate_out_per_1k: f64,
    ) -> Self {
        let input_cost = units_cost(input_units, rate_in_per_1k);
        let output_cost = units_cost(output_units, rate_out_per_1k);
        Self {
            input_units,
            output_units,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }

    /// Total cost formatted for display, e.g. `$0.0042`.
    #[must_use]
    pub fn display_cost(&self) -> String {
        format!("${:.4}", self.total_cost)
    }
}

/// Count units in both texts and convert them to cost.
///
/// `cost = (units / 1000) * rate` for each direction; no rounding.
#[must_use]
pub fn estimate(
    counter: &dyn TokenCounter,
    input_text: &str,
    output_text: &str,
    rate_in_per_1k: f64,
    rate_out_per_1k: f64,
) -> UsageEstimate {
    UsageEstimate::from_counts(
        counter.count(input_text),
        counter.count(output_text),
        rate_in_per_1k,
        rate_out_per_1k,
    )
}

#[allow(clippy::cast_precision_loss)]
fn units_cost(units: usize, rate_per_1k: f64) -> f64 {
    (units as f64 / UNITS_PER_RATE) * rate_per_1k
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One unit per whitespace-separated word.
    pub(crate) struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_empty_texts_cost_nothing() {
        let usage = estimate(&WordCounter, "", "", 0.0015, 0.002);
        assert_eq!(usage.input_units, 0);
        assert_eq!(usage.output_units, 0);
        assert!(close(usage.total_cost, 0.0));
    }

    #[test]
    fn test_cost_formula() {
        let input = vec!["w"; 2000].join(" ");
        let output = vec!["w"; 500].join(" ");
        let usage = estimate(&WordCounter, &input, &output, 0.0015, 0.002);
        assert_eq!(usage.input_units, 2000);
        assert_eq!(usage.output_units, 500);
        assert!(close(usage.input_cost, 0.003));
        assert!(close(usage.output_cost, 0.001));
        assert!(close(usage.total_cost, 0.004));
    }

    #[test]
    fn test_monotonic_in_unit_counts() {
        let pricing = Pricing::default();
        let mut previous = 0.0;
        for words in 0..50 {
            let text = vec!["amen"; words].join(" ");
            let usage = pricing.estimate(&WordCounter, &text, &text);
            assert!(usage.total_cost >= previous);
            previous = usage.total_cost;
        }
    }

    #[test]
    fn test_zero_rates_are_free() {
        let usage = UsageEstimate::from_counts(10_000, 10_000, 0.0, 0.0);
        assert!(close(usage.total_cost, 0.0));
    }

    #[test]
    fn test_no_internal_rounding() {
        let usage = UsageEstimate::from_counts(1, 0, 0.0015, 0.002);
        assert!(close(usage.input_cost, 0.000_001_5));
        assert_eq!(usage.display_cost(), "$0.0000");
    }

    #[test]
    fn test_display_cost_four_decimals() {
        let usage = UsageEstimate::from_counts(2000, 1000, 0.0015, 0.002);
        assert_eq!(usage.display_cost(), "$0.0050");
    }
}

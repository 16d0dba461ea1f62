//! Fee rates and the cached calculator snapshot

use serde::{Deserialize, Serialize};

/// Derived financial results, written back by the fee calculator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalculatorResults {
    pub monthly_turnover: f64,
    pub total_customer_payments: f64,
    pub total_company_costs: f64,
    pub effective_rate: f64,
    pub transaction_margin: f64,
    pub service_margin: f64,
    pub total_monthly_profit: f64,
}

/// Card fee rates in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fees {
    /// Legacy regulated-card rate
    pub regulated_cards: f64,
    /// Legacy unregulated-card rate
    pub unregulated_cards: f64,
    /// Single rate; mirrored into both legacy rates when set
    pub unified_rate: Option<f64>,
    pub calculator_results: Option<CalculatorResults>,
}

impl Default for Fees {
    fn default() -> Self {
        Self {
            regulated_cards: 0.9,
            unregulated_cards: 0.9,
            unified_rate: None,
            calculator_results: None,
        }
    }
}

impl Fees {
    pub fn with_unified_rate(mut self, rate: f64) -> Self {
        self.unified_rate = Some(rate);
        self.regulated_cards = rate;
        self.unregulated_cards = rate;
        self
    }

    /// Rate the calculator works with
    pub fn rate(&self) -> f64 {
        self.unified_rate.unwrap_or(self.regulated_cards)
    }

    /// Keep the legacy split in line with the unified rate
    pub fn sync_legacy_rates(&mut self) {
        if let Some(rate) = self.unified_rate {
            self.regulated_cards = rate;
            self.unregulated_cards = rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unified_rate_mirrors_into_legacy_split() {
        let fees = Fees::default().with_unified_rate(1.1);
        assert_eq!(fees.regulated_cards, 1.1);
        assert_eq!(fees.unregulated_cards, 1.1);
        assert_eq!(fees.rate(), 1.1);
    }

    #[test]
    fn legacy_rate_used_without_unified() {
        let fees = Fees {
            regulated_cards: 0.5,
            unregulated_cards: 1.5,
            ..Default::default()
        };
        assert_eq!(fees.rate(), 0.5);
    }
}

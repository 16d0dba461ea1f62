//! Fee and profit calculator
//!
//! Pure derivation of the merchant's monthly economics from location
//! turnover, device/service pricing and the card rate. Arithmetic runs on
//! `Decimal`; results are rounded to cents (the effective rate to four
//! places) before being stored as plain numbers.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::onboarding::{Addon, CalculatorResults, DynamicCard, Fees};
use crate::domain::OnboardingData;

/// Configuration for the fee calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Percentage points subtracted from the card rate before computing
    /// transaction revenue
    pub margin: f64,
    pub debounce_ms: u64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            margin: 0.2,
            debounce_ms: 300,
        }
    }
}

/// The slice of the aggregate the calculator reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculatorInput {
    /// Turnover of every location, legacy estimate already substituted
    pub location_turnovers: Vec<f64>,
    /// Card rate in percent
    pub rate: f64,
    pub cards: Vec<DynamicCard>,
}

impl CalculatorInput {
    /// Gather turnover, fees and devices from the aggregate
    pub fn from_data(data: &OnboardingData) -> Self {
        Self {
            location_turnovers: data.business_locations.iter().map(|l| l.turnover()).collect(),
            rate: data.fees.rate(),
            cards: data.device_selection.dynamic_cards.clone(),
        }
    }
}

fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

fn out(value: Decimal, dp: u32) -> f64 {
    value.round_dp(dp).to_f64().unwrap_or_default()
}

/// Monthly sum of `count * price` over cards and their add-ons
fn card_total(
    cards: &[DynamicCard],
    card_price: fn(&DynamicCard) -> f64,
    addon_price: fn(&Addon) -> f64,
) -> Decimal {
    cards
        .iter()
        .map(|card| {
            let count = Decimal::from(card.count);
            let addons: Decimal = card
                .addons
                .iter()
                .map(|addon| {
                    Decimal::from(addon.effective_quantity(card.count)) * dec(addon_price(addon))
                })
                .sum();
            count * dec(card_price(card)) + addons
        })
        .sum()
}

/// Service for fee/profit calculations
#[derive(Debug, Clone, Default)]
pub struct FeeCalculator {
    config: CalculatorConfig,
}

impl FeeCalculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Margin, customer payments, company costs and profit for `input`
    pub fn calculate(&self, input: &CalculatorInput) -> CalculatorResults {
        let monthly_turnover: Decimal = input.location_turnovers.iter().copied().map(dec).sum();
        let customer_payments = card_total(&input.cards, |c| c.monthly_fee, |a| a.monthly_fee);
        let company_costs = card_total(&input.cards, |c| c.company_cost, |a| a.company_cost);

        let effective_rate = (dec(input.rate) - dec(self.config.margin))
            .max(Decimal::ZERO)
            .round_dp(4);
        let transaction_margin = monthly_turnover * effective_rate / Decimal::ONE_HUNDRED;
        let service_margin = customer_payments - company_costs;
        let total_profit = transaction_margin + service_margin;

        CalculatorResults {
            monthly_turnover: out(monthly_turnover, 2),
            total_customer_payments: out(customer_payments, 2),
            total_company_costs: out(company_costs, 2),
            effective_rate: out(effective_rate, 4),
            transaction_margin: out(transaction_margin, 2),
            service_margin: out(service_margin, 2),
            total_monthly_profit: out(total_profit, 2),
        }
    }

    /// Fee record carrying fresh results, or `None` when the cached results
    /// are already current
    pub fn recompute(&self, data: &OnboardingData) -> Option<Fees> {
        let results = self.calculate(&CalculatorInput::from_data(data));
        if data.fees.calculator_results.as_ref() == Some(&results) {
            return None;
        }
        debug!(
            turnover = results.monthly_turnover,
            profit = results.total_monthly_profit,
            "Fee calculator results changed"
        );
        let mut fees = data.fees.clone();
        fees.calculator_results = Some(results);
        Some(fees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::onboarding::BusinessLocation;

    fn terminal() -> DynamicCard {
        DynamicCard {
            name: "Terminal".into(),
            count: 2,
            monthly_fee: 15.0,
            company_cost: 9.0,
            ..Default::default()
        }
    }

    #[test]
    fn single_location_single_card() {
        let input = CalculatorInput {
            location_turnovers: vec![10000.0],
            rate: 0.9,
            cards: vec![terminal()],
        };
        let results = FeeCalculator::default().calculate(&input);

        assert_eq!(results.monthly_turnover, 10000.0);
        assert_eq!(results.effective_rate, 0.7);
        assert_eq!(results.transaction_margin, 70.0);
        assert_eq!(results.total_customer_payments, 30.0);
        assert_eq!(results.total_company_costs, 18.0);
        assert_eq!(results.service_margin, 12.0);
        assert_eq!(results.total_monthly_profit, 82.0);
    }

    #[test]
    fn addon_quantities() {
        let mut card = terminal();
        card.addons = vec![
            Addon {
                monthly_fee: 2.0,
                company_cost: 1.0,
                is_per_device: true,
                ..Default::default()
            },
            Addon {
                monthly_fee: 5.0,
                company_cost: 4.0,
                custom_quantity: Some(3),
                ..Default::default()
            },
            Addon {
                monthly_fee: 10.0,
                company_cost: 0.5,
                ..Default::default()
            },
        ];
        let input = CalculatorInput {
            location_turnovers: Vec::new(),
            rate: 0.9,
            cards: vec![card],
        };
        let results = FeeCalculator::default().calculate(&input);

        // 30 + 2*2 + 3*5 + 1*10
        assert_eq!(results.total_customer_payments, 59.0);
        // 18 + 2*1 + 3*4 + 1*0.5
        assert_eq!(results.total_company_costs, 32.5);
        assert_eq!(results.service_margin, 26.5);
        assert_eq!(results.transaction_margin, 0.0);
    }

    #[test]
    fn rate_below_margin_clamps_to_zero() {
        let input = CalculatorInput {
            location_turnovers: vec![50000.0],
            rate: 0.1,
            cards: Vec::new(),
        };
        let results = FeeCalculator::default().calculate(&input);
        assert_eq!(results.effective_rate, 0.0);
        assert_eq!(results.total_monthly_profit, 0.0);
    }

    #[test]
    fn legacy_turnover_is_used_as_fallback() {
        let mut data = OnboardingData::default();
        data.business_locations.push(BusinessLocation {
            monthly_turnover: Some(4000.0),
            ..Default::default()
        });
        data.business_locations.push(BusinessLocation {
            estimated_turnover: Some(6000.0),
            ..Default::default()
        });
        let input = CalculatorInput::from_data(&data);
        assert_eq!(input.location_turnovers, vec![4000.0, 6000.0]);
        assert_eq!(FeeCalculator::default().calculate(&input).monthly_turnover, 10000.0);
    }

    #[test]
    fn recompute_only_when_results_change() {
        let calculator = FeeCalculator::new(CalculatorConfig {
            margin: 0.3,
            ..Default::default()
        });
        let mut data = OnboardingData::default();
        data.fees = Fees::default().with_unified_rate(1.3);
        data.business_locations.push(BusinessLocation {
            monthly_turnover: Some(1000.0),
            ..Default::default()
        });

        let fees = calculator.recompute(&data).unwrap();
        let results = fees.calculator_results.clone().unwrap();
        assert_eq!(results.effective_rate, 1.0);
        assert_eq!(results.transaction_margin, 10.0);

        data.fees = fees;
        assert!(calculator.recompute(&data).is_none());
    }
}

//! Application services

mod fee_calculator;

pub use fee_calculator::{CalculatorConfig, CalculatorInput, FeeCalculator};

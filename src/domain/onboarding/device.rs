//! Device and service selection

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    #[default]
    Device,
    Service,
}

/// Extra priced item attached to a device or service card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub category: String,
    pub monthly_fee: f64,
    pub company_cost: f64,
    /// Quantity follows the parent card's count
    pub is_per_device: bool,
    pub custom_quantity: Option<u32>,
}

impl Default for Addon {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            category: String::new(),
            monthly_fee: 0.0,
            company_cost: 0.0,
            is_per_device: false,
            custom_quantity: None,
        }
    }
}

impl Addon {
    pub fn effective_quantity(&self, parent_count: u32) -> u32 {
        if self.is_per_device {
            parent_count
        } else {
            self.custom_quantity.unwrap_or(1)
        }
    }
}

/// A selected device or service with its pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamicCard {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub name: String,
    pub count: u32,
    pub monthly_fee: f64,
    pub company_cost: f64,
    pub addons: Vec<Addon>,
}

impl Default for DynamicCard {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: CardKind::Device,
            name: String::new(),
            count: 1,
            monthly_fee: 0.0,
            company_cost: 0.0,
            addons: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceSelection {
    pub selected_solutions: Vec<String>,
    pub dynamic_cards: Vec<DynamicCard>,
    pub note: String,
}

impl DeviceSelection {
    pub fn has_any_selection(&self) -> bool {
        !self.selected_solutions.is_empty() || !self.dynamic_cards.is_empty()
    }
}

//! Operating locations (points of sale)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::company::Address;
use super::contact::ContactPerson;

pub const DEFAULT_CURRENCY: &str = "CZK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BankAccountFormat {
    #[default]
    Iban,
    /// Domestic account number plus bank code
    AccountNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankAccount {
    pub id: String,
    pub format: BankAccountFormat,
    pub iban: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
    pub is_primary: bool,
}

impl Default for BankAccount {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            format: BankAccountFormat::Iban,
            iban: String::new(),
            account_number: String::new(),
            bank_code: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            is_primary: true,
        }
    }
}

impl BankAccount {
    pub fn from_iban(iban: impl Into<String>) -> Self {
        Self {
            iban: iban.into(),
            ..Self::default()
        }
    }

    /// The identifying fields for the account's format are filled in
    pub fn has_account_details(&self) -> bool {
        match self.format {
            BankAccountFormat::Iban => !self.iban.trim().is_empty(),
            BankAccountFormat::AccountNumber => {
                !self.account_number.trim().is_empty() && !self.bank_code.trim().is_empty()
            }
        }
    }
}

pub const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Opening hours for one weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpeningHours {
    pub day: String,
    pub open: String,
    pub close: String,
    pub is_open: bool,
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            day: WEEKDAYS[0].to_string(),
            open: "09:00".to_string(),
            close: "17:00".to_string(),
            is_open: true,
        }
    }
}

/// Mon-Fri 09:00-17:00, weekend closed
pub fn default_week() -> Vec<OpeningHours> {
    WEEKDAYS
        .iter()
        .enumerate()
        .map(|(i, day)| OpeningHours {
            day: day.to_string(),
            is_open: i < 5,
            ..OpeningHours::default()
        })
        .collect()
}

/// Compact text form of the weekly hours kept in the legacy `openingHours` field
pub fn summarize_week(week: &[OpeningHours]) -> String {
    week.iter()
        .filter(|h| h.is_open)
        .map(|h| {
            let day: String = h.day.chars().take(3).collect();
            format!("{} {}-{}", day, h.open, h.close)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Seasonality {
    #[default]
    YearRound,
    Seasonal,
    Irregular,
}

/// One operating location of the merchant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessLocation {
    pub id: String,
    pub name: String,
    #[serde(rename = "hasPOS")]
    pub has_pos: bool,
    pub address: Address,
    pub bank_accounts: Vec<BankAccount>,
    pub contact_person: ContactPerson,
    pub business_subject: String,
    pub mcc_code: String,
    pub monthly_turnover: Option<f64>,
    pub average_transaction: Option<f64>,
    pub seasonality: Seasonality,
    pub opening_hours_detailed: Vec<OpeningHours>,
    pub assigned_persons: Vec<String>,

    // Legacy mirrors, derived from the structured fields above
    pub iban: String,
    pub business_sector: String,
    pub estimated_turnover: Option<f64>,
    pub opening_hours: String,
}

impl Default for BusinessLocation {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            has_pos: true,
            address: Address::default(),
            bank_accounts: Vec::new(),
            contact_person: ContactPerson::default(),
            business_subject: String::new(),
            mcc_code: String::new(),
            monthly_turnover: None,
            average_transaction: None,
            seasonality: Seasonality::default(),
            opening_hours_detailed: Vec::new(),
            assigned_persons: Vec::new(),
            iban: String::new(),
            business_sector: String::new(),
            estimated_turnover: None,
            opening_hours: String::new(),
        }
    }
}

impl BusinessLocation {
    /// New location at `address` with a seeded bank account and default hours
    pub fn seeded(address: Address) -> Self {
        let mut location = Self {
            address,
            bank_accounts: vec![BankAccount::default()],
            opening_hours_detailed: default_week(),
            ..Self::default()
        };
        location.sync_legacy_fields();
        location
    }

    pub fn primary_bank_account(&self) -> Option<&BankAccount> {
        self.bank_accounts
            .iter()
            .find(|a| a.is_primary)
            .or_else(|| self.bank_accounts.first())
    }

    /// Turnover with the legacy estimate as fallback
    pub fn turnover(&self) -> f64 {
        self.monthly_turnover
            .or(self.estimated_turnover)
            .unwrap_or(0.0)
    }

    /// Re-derive the legacy scalar fields from their structured counterparts.
    ///
    /// A mirror whose source is empty is blanked, so clearing a structured
    /// field never lets the stale mirror win on the next read.
    pub fn sync_legacy_fields(&mut self) {
        self.iban = self
            .primary_bank_account()
            .filter(|account| account.format == BankAccountFormat::Iban)
            .map(|account| account.iban.clone())
            .unwrap_or_default();
        self.business_sector = self.business_subject.clone();
        self.estimated_turnover = self.monthly_turnover;
        self.opening_hours = if self.opening_hours_detailed.is_empty() {
            String::new()
        } else {
            summarize_week(&self.opening_hours_detailed)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_week_has_seven_days_weekend_closed() {
        let week = default_week();
        assert_eq!(week.len(), 7);
        assert!(week[..5].iter().all(|d| d.is_open));
        assert!(week[5..].iter().all(|d| !d.is_open));
        assert_eq!(week[6].day, "sunday");
    }

    #[test]
    fn seeded_location_mirrors_legacy_fields() {
        let location = BusinessLocation::seeded(Address::default());
        assert_eq!(location.bank_accounts.len(), 1);
        assert_eq!(location.opening_hours_detailed.len(), 7);
        assert!(location.opening_hours.starts_with("mon 09:00-17:00"));
    }

    #[test]
    fn sync_copies_structured_values() {
        let mut location = BusinessLocation {
            bank_accounts: vec![BankAccount::from_iban("CZ6508000000192000145399")],
            business_subject: "Cafe".into(),
            monthly_turnover: Some(120_000.0),
            ..Default::default()
        };
        location.sync_legacy_fields();
        assert_eq!(location.iban, "CZ6508000000192000145399");
        assert_eq!(location.business_sector, "Cafe");
        assert_eq!(location.estimated_turnover, Some(120_000.0));
    }

    #[test]
    fn sync_blanks_mirrors_of_cleared_fields() {
        let mut location = BusinessLocation::seeded(Address::default());
        location.bank_accounts = vec![BankAccount::from_iban("CZ6508000000192000145399")];
        location.business_subject = "Cafe".into();
        location.monthly_turnover = Some(120_000.0);
        location.sync_legacy_fields();

        location.bank_accounts.clear();
        location.business_subject.clear();
        location.monthly_turnover = None;
        location.opening_hours_detailed.clear();
        location.sync_legacy_fields();

        assert_eq!(location.iban, "");
        assert_eq!(location.business_sector, "");
        assert_eq!(location.estimated_turnover, None);
        assert_eq!(location.opening_hours, "");
        assert_eq!(location.turnover(), 0.0);
    }

    #[test]
    fn turnover_falls_back_to_estimate() {
        let location = BusinessLocation {
            estimated_turnover: Some(5_000.0),
            ..Default::default()
        };
        assert_eq!(location.turnover(), 5_000.0);
    }

    #[test]
    fn account_number_format_needs_bank_code() {
        let mut account = BankAccount {
            format: BankAccountFormat::AccountNumber,
            account_number: "19-2000145399".into(),
            ..Default::default()
        };
        assert!(!account.has_account_details());
        account.bank_code = "0800".into();
        assert!(account.has_account_details());
    }

    #[test]
    fn deserializes_pos_flag() {
        let location: BusinessLocation =
            serde_json::from_str(r#"{"id":"l1","name":"Shop","hasPOS":false}"#).unwrap();
        assert!(!location.has_pos);
        assert!(location.bank_accounts.is_empty());
    }
}

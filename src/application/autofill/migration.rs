//! Upgrade of snapshots written before the structured location fields existed

use tracing::{debug, info};

use crate::domain::onboarding::{default_week, BankAccount, BusinessLocation};
use crate::domain::{OnboardingData, SCHEMA_VERSION};

/// Fill the structured fields of a legacy location from its scalar mirrors,
/// then re-derive the mirrors. Returns whether the location changed.
///
/// Running it on an already migrated location changes nothing.
pub fn migrate_location(location: &mut BusinessLocation) -> bool {
    let before = location.clone();

    if location.bank_accounts.is_empty() && !location.iban.trim().is_empty() {
        location
            .bank_accounts
            .push(BankAccount::from_iban(location.iban.trim()));
    }
    if location.opening_hours_detailed.is_empty() {
        location.opening_hours_detailed = default_week();
    }
    if location.business_subject.trim().is_empty() && !location.business_sector.trim().is_empty() {
        location.business_subject = location.business_sector.clone();
    }
    if location.monthly_turnover.is_none() {
        location.monthly_turnover = location.estimated_turnover;
    }
    location.sync_legacy_fields();

    let changed = *location != before;
    if changed {
        debug!(location_id = %location.id, "Migrated legacy business location");
    }
    changed
}

/// Migrate every location of the list
pub fn migrate_locations(locations: &mut [BusinessLocation]) -> bool {
    locations
        .iter_mut()
        .fold(false, |changed, location| migrate_location(location) || changed)
}

/// Bring a loaded snapshot up to the current schema.
pub fn migrate_data(data: &mut OnboardingData) -> bool {
    let mut changed = migrate_locations(&mut data.business_locations);

    let fees_before = data.fees.clone();
    data.fees.sync_legacy_rates();
    changed |= data.fees != fees_before;

    if data.version < SCHEMA_VERSION {
        info!(
            from = data.version,
            to = SCHEMA_VERSION,
            "Upgraded onboarding snapshot schema"
        );
        data.version = SCHEMA_VERSION;
        changed = true;
    }
    changed
}

impl OnboardingData {
    /// Upgrade this snapshot in place, see [`migrate_data`]
    pub fn migrate(&mut self) -> bool {
        migrate_data(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_location() -> BusinessLocation {
        serde_json::from_value(serde_json::json!({
            "id": "loc-1",
            "name": "Bistro",
            "iban": "CZ6508000000192000145399",
            "businessSector": "Gastro",
            "estimatedTurnover": 250000.0,
            "openingHours": "daily"
        }))
        .unwrap()
    }

    #[test]
    fn legacy_fields_are_upgraded() {
        let mut location = legacy_location();
        assert!(migrate_location(&mut location));

        assert_eq!(location.bank_accounts.len(), 1);
        assert_eq!(location.bank_accounts[0].iban, "CZ6508000000192000145399");
        assert_eq!(location.business_subject, "Gastro");
        assert_eq!(location.monthly_turnover, Some(250000.0));
        assert_eq!(location.opening_hours_detailed, default_week());
        assert_eq!(location.iban, "CZ6508000000192000145399");
    }

    #[test]
    fn migration_is_idempotent() {
        let mut once = legacy_location();
        migrate_location(&mut once);

        let mut twice = once.clone();
        assert!(!migrate_location(&mut twice));
        assert_eq!(once, twice);
    }

    #[test]
    fn structured_fields_win_over_legacy() {
        let mut location = legacy_location();
        location.business_subject = "Coffee".into();
        location.monthly_turnover = Some(1000.0);
        location.bank_accounts = vec![BankAccount::from_iban("CZ0000")];

        migrate_location(&mut location);
        assert_eq!(location.business_subject, "Coffee");
        assert_eq!(location.business_sector, "Coffee");
        assert_eq!(location.monthly_turnover, Some(1000.0));
        assert_eq!(location.bank_accounts.len(), 1);
        assert_eq!(location.iban, "CZ0000");
    }

    #[test]
    fn old_schema_version_is_bumped() {
        let mut data: OnboardingData = serde_json::from_value(serde_json::json!({
            "version": 1,
            "businessLocations": [{ "id": "a", "iban": "CZ11" }]
        }))
        .unwrap();

        assert!(migrate_data(&mut data));
        assert_eq!(data.version, SCHEMA_VERSION);
        assert!(!migrate_data(&mut data));
    }
}

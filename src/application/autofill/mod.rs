//! Auto-fill propagator
//!
//! Keeps records that depend on the contact info and on the two address
//! toggles of the company consistent with their source. The propagator
//! never writes directly: [`AutoFill::react`] inspects the current aggregate
//! and returns the sections it wants replaced, which the session applies
//! through the regular update contract.

pub mod address_sync;
pub mod contact_sync;
pub mod migration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::onboarding::{Address, ContactInfo};
use crate::domain::{OnboardingData, PartialOnboardingData};

pub use migration::{migrate_data, migrate_location, migrate_locations};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoFillConfig {
    pub enabled: bool,
    /// Delay before reacting to a burst of edits
    pub debounce_ms: u64,
    /// Derive an authorized person and an owner from a complete contact
    pub derive_persons: bool,
    pub sync_location_contacts: bool,
}

impl Default for AutoFillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 150,
            derive_persons: true,
            sync_location_contacts: true,
        }
    }
}

/// Stateful reactor remembering what it last propagated
#[derive(Debug, Clone)]
pub struct AutoFill {
    config: AutoFillConfig,
    /// Contact as of the last time it was complete
    last_complete_contact: Option<ContactInfo>,
    contact_address_linked: bool,
    operating_address_linked: bool,
    head_office: Address,
}

impl AutoFill {
    pub fn new(config: AutoFillConfig) -> Self {
        Self {
            config,
            last_complete_contact: None,
            contact_address_linked: false,
            operating_address_linked: false,
            head_office: Address::default(),
        }
    }

    pub fn config(&self) -> &AutoFillConfig {
        &self.config
    }

    /// Adopt the state of a loaded aggregate without reacting to it
    pub fn prime(&mut self, data: &OnboardingData) {
        let company = &data.company_info;
        self.contact_address_linked = company.contact_address_same_as_main;
        self.operating_address_linked = company.head_office_equals_operating_address;
        self.head_office = company.head_office_address.clone();
        self.last_complete_contact = data
            .contact_info
            .is_basic_complete()
            .then(|| data.contact_info.clone());
    }

    /// Sections to replace so dependents match their sources again.
    ///
    /// Calling it again on the aggregate that results from applying the
    /// returned update yields `None`.
    pub fn react(&mut self, data: &OnboardingData) -> Option<PartialOnboardingData> {
        if !self.config.enabled {
            return None;
        }

        let mut partial = PartialOnboardingData::default();
        self.react_to_contact(data, &mut partial);
        self.react_to_addresses(data, &mut partial);

        if partial.is_empty() {
            return None;
        }
        debug!(sections = ?partial.sections(), "Auto-fill propagating changes");
        Some(partial)
    }

    fn react_to_contact(&mut self, data: &OnboardingData, partial: &mut PartialOnboardingData) {
        let contact = &data.contact_info;
        if !contact.is_basic_complete() || self.last_complete_contact.as_ref() == Some(contact) {
            return;
        }
        let previous = self.last_complete_contact.replace(contact.clone());

        if self.config.derive_persons {
            if let Some((persons, created)) = contact_sync::sync_authorized_persons(
                &data.authorized_persons,
                previous.as_ref(),
                contact,
            ) {
                if let Some(id) = created {
                    partial.consents = contact_sync::default_signer(&data.consents, &persons, &id);
                }
                partial.authorized_persons = Some(persons);
            }
            partial.actual_owners =
                contact_sync::sync_actual_owners(&data.actual_owners, previous.as_ref(), contact);
        }

        if self.config.sync_location_contacts {
            if let Some(previous) = previous.as_ref() {
                partial.business_locations = contact_sync::sync_location_contacts(
                    &data.business_locations,
                    previous,
                    contact,
                );
            }
        }
    }

    fn react_to_addresses(&mut self, data: &OnboardingData, partial: &mut PartialOnboardingData) {
        let company = &data.company_info;
        let head_office = &company.head_office_address;
        let head_office_changed = *head_office != self.head_office;

        if company.contact_address_same_as_main
            && (!self.contact_address_linked || head_office_changed)
        {
            partial.company_info = address_sync::sync_contact_address(company);
        }

        if company.head_office_equals_operating_address
            && (!self.operating_address_linked || head_office_changed)
        {
            let locations = partial
                .business_locations
                .as_deref()
                .unwrap_or(&data.business_locations);
            if let Some(locations) =
                address_sync::sync_operating_address(locations, head_office, &data.contact_info)
            {
                partial.business_locations = Some(locations);
            }
        }

        self.contact_address_linked = company.contact_address_same_as_main;
        self.operating_address_linked = company.head_office_equals_operating_address;
        self.head_office = head_office.clone();
    }
}

impl Default for AutoFill {
    fn default() -> Self {
        Self::new(AutoFillConfig::default())
    }
}

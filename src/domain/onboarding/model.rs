//! Onboarding aggregate root

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::company::CompanyInfo;
use super::consents::Consents;
use super::contact::ContactInfo;
use super::device::DeviceSelection;
use super::fees::Fees;
use super::location::BusinessLocation;
use super::person::{ActualOwner, AuthorizedPerson};
use super::step::OnboardingStep;

/// Current schema version of persisted snapshots
pub const SCHEMA_VERSION: u32 = 2;

/// The complete registration record collected by the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingData {
    pub version: u32,
    /// Session / contract identifier; remote auto-save runs only while set
    pub session_id: Option<String>,
    pub current_step: usize,
    pub visited_steps: BTreeSet<usize>,
    pub contact_info: ContactInfo,
    pub company_info: CompanyInfo,
    pub business_locations: Vec<BusinessLocation>,
    pub device_selection: DeviceSelection,
    pub fees: Fees,
    pub authorized_persons: Vec<AuthorizedPerson>,
    pub actual_owners: Vec<ActualOwner>,
    pub consents: Consents,
}

impl Default for OnboardingData {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            session_id: None,
            current_step: 0,
            visited_steps: BTreeSet::new(),
            contact_info: ContactInfo::default(),
            company_info: CompanyInfo::default(),
            business_locations: Vec::new(),
            device_selection: DeviceSelection::default(),
            fees: Fees::default(),
            authorized_persons: Vec::new(),
            actual_owners: Vec::new(),
            consents: Consents::default(),
        }
    }
}

impl OnboardingData {
    pub fn has_visited(&self, step: OnboardingStep) -> bool {
        self.visited_steps.contains(&step.index())
    }

    pub fn authorized_person(&self, id: &str) -> Option<&AuthorizedPerson> {
        self.authorized_persons.iter().find(|p| p.id == id)
    }

    /// Resolve the weak `signingPersonId` reference
    pub fn signing_person(&self) -> Option<&AuthorizedPerson> {
        self.consents
            .signing_person_id
            .as_deref()
            .and_then(|id| self.authorized_person(id))
    }

    /// JSON projection used by path-based rules
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

//! Partial update of the aggregate (top-level shallow merge)

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::company::CompanyInfo;
use super::consents::Consents;
use super::contact::ContactInfo;
use super::device::DeviceSelection;
use super::fees::Fees;
use super::location::BusinessLocation;
use super::model::OnboardingData;
use super::person::{ActualOwner, AuthorizedPerson};

/// Top-level section of the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    SessionId,
    CurrentStep,
    VisitedSteps,
    ContactInfo,
    CompanyInfo,
    BusinessLocations,
    DeviceSelection,
    Fees,
    AuthorizedPersons,
    ActualOwners,
    Consents,
}

impl Section {
    /// Changes to these sections are written to the local cache immediately
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Self::ContactInfo
                | Self::BusinessLocations
                | Self::DeviceSelection
                | Self::Fees
                | Self::SessionId
        )
    }
}

/// Sections to replace; `None` keeps the current value.
///
/// `session_id` is doubly optional so a caller can clear it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialOnboardingData {
    pub session_id: Option<Option<String>>,
    pub current_step: Option<usize>,
    pub visited_steps: Option<BTreeSet<usize>>,
    pub contact_info: Option<ContactInfo>,
    pub company_info: Option<CompanyInfo>,
    pub business_locations: Option<Vec<BusinessLocation>>,
    pub device_selection: Option<DeviceSelection>,
    pub fees: Option<Fees>,
    pub authorized_persons: Option<Vec<AuthorizedPerson>>,
    pub actual_owners: Option<Vec<ActualOwner>>,
    pub consents: Option<Consents>,
}

impl PartialOnboardingData {
    pub fn is_empty(&self) -> bool {
        self.sections().is_empty()
    }

    /// Sections this partial mentions
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();
        if self.session_id.is_some() {
            sections.push(Section::SessionId);
        }
        if self.current_step.is_some() {
            sections.push(Section::CurrentStep);
        }
        if self.visited_steps.is_some() {
            sections.push(Section::VisitedSteps);
        }
        if self.contact_info.is_some() {
            sections.push(Section::ContactInfo);
        }
        if self.company_info.is_some() {
            sections.push(Section::CompanyInfo);
        }
        if self.business_locations.is_some() {
            sections.push(Section::BusinessLocations);
        }
        if self.device_selection.is_some() {
            sections.push(Section::DeviceSelection);
        }
        if self.fees.is_some() {
            sections.push(Section::Fees);
        }
        if self.authorized_persons.is_some() {
            sections.push(Section::AuthorizedPersons);
        }
        if self.actual_owners.is_some() {
            sections.push(Section::ActualOwners);
        }
        if self.consents.is_some() {
            sections.push(Section::Consents);
        }
        sections
    }

    /// Set or clear (`None`) the server session id
    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Replace the contact section
    pub fn with_contact_info(mut self, contact_info: ContactInfo) -> Self {
        self.contact_info = Some(contact_info);
        self
    }

    /// Replace the company section
    pub fn with_company_info(mut self, company_info: CompanyInfo) -> Self {
        self.company_info = Some(company_info);
        self
    }

    /// Replace the whole location list; locations missing from it are removed
    pub fn with_business_locations(mut self, locations: Vec<BusinessLocation>) -> Self {
        self.business_locations = Some(locations);
        self
    }

    /// Replace the device selection
    pub fn with_device_selection(mut self, device_selection: DeviceSelection) -> Self {
        self.device_selection = Some(device_selection);
        self
    }

    /// Replace the fee record
    pub fn with_fees(mut self, fees: Fees) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Replace the list of authorized persons
    pub fn with_authorized_persons(mut self, persons: Vec<AuthorizedPerson>) -> Self {
        self.authorized_persons = Some(persons);
        self
    }

    /// Replace the list of beneficial owners
    pub fn with_actual_owners(mut self, owners: Vec<ActualOwner>) -> Self {
        self.actual_owners = Some(owners);
        self
    }

    /// Replace the consent flags
    pub fn with_consents(mut self, consents: Consents) -> Self {
        self.consents = Some(consents);
        self
    }
}

impl OnboardingData {
    /// Shallow merge: every supplied section replaces the current one whole.
    ///
    /// `self` is left untouched; the merged copy is returned.
    pub fn merge(&self, partial: PartialOnboardingData) -> OnboardingData {
        let mut next = self.clone();
        if let Some(session_id) = partial.session_id {
            next.session_id = session_id;
        }
        if let Some(step) = partial.current_step {
            next.current_step = step;
        }
        if let Some(visited) = partial.visited_steps {
            next.visited_steps = visited;
        }
        if let Some(contact_info) = partial.contact_info {
            next.contact_info = contact_info;
        }
        if let Some(company_info) = partial.company_info {
            next.company_info = company_info;
        }
        if let Some(locations) = partial.business_locations {
            next.business_locations = locations;
        }
        if let Some(device_selection) = partial.device_selection {
            next.device_selection = device_selection;
        }
        if let Some(fees) = partial.fees {
            next.fees = fees;
        }
        if let Some(persons) = partial.authorized_persons {
            next.authorized_persons = persons;
        }
        if let Some(owners) = partial.actual_owners {
            next.actual_owners = owners;
        }
        if let Some(consents) = partial.consents {
            next.consents = consents;
        }
        next
    }

    /// Sections whose value differs between `self` and `other`
    pub fn diff_sections(&self, other: &OnboardingData) -> Vec<Section> {
        let mut changed = Vec::new();
        if self.session_id != other.session_id {
            changed.push(Section::SessionId);
        }
        if self.current_step != other.current_step {
            changed.push(Section::CurrentStep);
        }
        if self.visited_steps != other.visited_steps {
            changed.push(Section::VisitedSteps);
        }
        if self.contact_info != other.contact_info {
            changed.push(Section::ContactInfo);
        }
        if self.company_info != other.company_info {
            changed.push(Section::CompanyInfo);
        }
        if self.business_locations != other.business_locations {
            changed.push(Section::BusinessLocations);
        }
        if self.device_selection != other.device_selection {
            changed.push(Section::DeviceSelection);
        }
        if self.fees != other.fees {
            changed.push(Section::Fees);
        }
        if self.authorized_persons != other.authorized_persons {
            changed.push(Section::AuthorizedPersons);
        }
        if self.actual_owners != other.actual_owners {
            changed.push(Section::ActualOwners);
        }
        if self.consents != other.consents {
            changed.push(Section::Consents);
        }
        changed
    }
}

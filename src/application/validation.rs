//! Step validation engine
//!
//! Queried per step; holds no wizard state of its own. Each step yields a
//! list of field issues, a pass/fail verdict and a completion percentage.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::fields::{resolve_step_fields, ResolvedFields};
use crate::domain::onboarding::{Address, ContactPerson};
use crate::domain::{OnboardingData, OnboardingStep};
use crate::shared::utills::json_path;
use crate::shared::validations::{is_valid_email, is_valid_phone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Outcome of validating one step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub step: OnboardingStep,
    pub issues: Vec<ValidationIssue>,
    pub is_valid: bool,
    /// The step reported valid only because of the presentation override
    pub override_applied: bool,
    pub completion: u8,
}

impl StepValidation {
    /// Issues that make the step invalid
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    /// Issues shown to the user that do not block the step
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Knobs of the validator.
///
/// `presentation_override` lists steps that always report valid, whatever
/// their errors. Meant for demo walkthroughs; empty by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationPolicy {
    pub presentation_override: BTreeSet<OnboardingStep>,
}

impl ValidationPolicy {
    pub fn with_override(mut self, step: OnboardingStep) -> Self {
        self.presentation_override.insert(step);
        self
    }

    pub fn overrides(&self, step: OnboardingStep) -> bool {
        self.presentation_override.contains(&step)
    }
}

/// Number of fields a step is scored on when it has errors
fn field_count(step: OnboardingStep) -> usize {
    match step {
        OnboardingStep::Contact => 4,
        OnboardingStep::Company => 9,
        OnboardingStep::Locations => 3,
        OnboardingStep::DeviceSelection => 1,
        OnboardingStep::Fees => 1,
        OnboardingStep::AuthorizedPersons => 1,
        OnboardingStep::ActualOwners => 1,
        OnboardingStep::Consents => 2,
    }
}

const REQUIRED: &str = "is required";

#[derive(Debug, Clone, Default)]
pub struct StepValidator {
    policy: ValidationPolicy,
}

impl StepValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        if !policy.presentation_override.is_empty() {
            warn!(
                steps = ?policy.presentation_override,
                "Presentation override active, these steps always report valid"
            );
        }
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Validate `step` against the built-in field set
    pub fn validate(&self, data: &OnboardingData, step: OnboardingStep) -> StepValidation {
        self.validate_with_fields(data, &resolve_step_fields(step, None))
    }

    /// Validate a step against its resolved (possibly configured) field set
    pub fn validate_with_fields(
        &self,
        data: &OnboardingData,
        fields: &ResolvedFields,
    ) -> StepValidation {
        let step = fields.step;
        if !fields.enabled {
            debug!(%step, "Step disabled by field configuration, skipping validation");
            return StepValidation {
                step,
                issues: Vec::new(),
                is_valid: true,
                override_applied: false,
                completion: 100,
            };
        }

        let mut issues = builtin_issues(data, step);
        issues.retain(|issue| {
            fields
                .field(&field_pattern(&issue.field))
                .map(|f| f.enabled)
                .unwrap_or(true)
        });
        issues.extend(configured_issues(data, fields));

        let has_errors = issues.iter().any(ValidationIssue::is_error);
        let override_applied = has_errors && self.policy.overrides(step);
        let completion = completion_for(data, step, &issues);

        StepValidation {
            step,
            is_valid: !has_errors || override_applied,
            override_applied,
            completion,
            issues,
        }
    }

    /// Shorthand for `validate(..).is_valid`
    pub fn is_valid(&self, data: &OnboardingData, step: OnboardingStep) -> bool {
        self.validate(data, step).is_valid
    }

    /// Validate every step in wizard order
    pub fn validate_all(&self, data: &OnboardingData) -> Vec<StepValidation> {
        OnboardingStep::ALL
            .iter()
            .map(|step| self.validate(data, *step))
            .collect()
    }
}

/// `businessLocations[2].name` -> `businessLocations[].name`
fn field_pattern(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut in_index = false;
    for c in field.chars() {
        match c {
            '[' => {
                in_index = true;
                out.push('[');
            }
            ']' => {
                in_index = false;
                out.push(']');
            }
            _ if in_index => {}
            _ => out.push(c),
        }
    }
    out
}

fn require_text(issues: &mut Vec<ValidationIssue>, field: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::error(field, REQUIRED));
    }
}

fn require_address(issues: &mut Vec<ValidationIssue>, prefix: &str, address: &Address) {
    require_text(issues, &format!("{}.street", prefix), &address.street);
    require_text(issues, &format!("{}.city", prefix), &address.city);
    require_text(issues, &format!("{}.zipCode", prefix), &address.zip_code);
}

fn require_contact_person(issues: &mut Vec<ValidationIssue>, prefix: &str, person: &ContactPerson) {
    require_text(issues, &format!("{}.firstName", prefix), &person.first_name);
    require_text(issues, &format!("{}.lastName", prefix), &person.last_name);
    require_text(issues, &format!("{}.email", prefix), &person.email);
    require_text(issues, &format!("{}.phone", prefix), &person.phone);
}

fn builtin_issues(data: &OnboardingData, step: OnboardingStep) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    match step {
        OnboardingStep::Contact => {
            let contact = &data.contact_info;
            require_text(&mut issues, "contactInfo.firstName", &contact.first_name);
            require_text(&mut issues, "contactInfo.lastName", &contact.last_name);
            if contact.email.trim().is_empty() {
                issues.push(ValidationIssue::error("contactInfo.email", REQUIRED));
            } else if !is_valid_email(&contact.email) {
                issues.push(ValidationIssue::error(
                    "contactInfo.email",
                    "is not a valid email address",
                ));
            }
            if contact.phone.trim().is_empty() {
                issues.push(ValidationIssue::error("contactInfo.phone", REQUIRED));
            } else if !is_valid_phone(&contact.phone) {
                issues.push(ValidationIssue::warning(
                    "contactInfo.phone",
                    "looks too short for a phone number",
                ));
            }
        }
        OnboardingStep::Company => {
            let company = &data.company_info;
            require_text(&mut issues, "companyInfo.ico", &company.ico);
            require_text(&mut issues, "companyInfo.companyName", &company.company_name);
            require_address(&mut issues, "companyInfo.headOfficeAddress", &company.head_office_address);
            require_contact_person(&mut issues, "companyInfo.contactPerson", &company.contact_person);
        }
        OnboardingStep::Locations => {
            if data.business_locations.is_empty() {
                issues.push(ValidationIssue::error(
                    "businessLocations",
                    "at least one location is required",
                ));
            }
            for (i, location) in data.business_locations.iter().enumerate() {
                let prefix = format!("businessLocations[{}]", i);
                require_text(&mut issues, &format!("{}.name", prefix), &location.name);
                if !location.address.is_complete() {
                    issues.push(ValidationIssue::error(
                        format!("{}.address", prefix),
                        "street, city and zip code are required",
                    ));
                }
            }
        }
        OnboardingStep::DeviceSelection => {
            if !data.device_selection.has_any_selection() {
                issues.push(ValidationIssue::warning(
                    "deviceSelection",
                    "no solution or device selected",
                ));
            }
        }
        OnboardingStep::Fees => {}
        OnboardingStep::AuthorizedPersons => {
            if data.authorized_persons.is_empty() {
                issues.push(ValidationIssue::error(
                    "authorizedPersons",
                    "at least one authorized person is required",
                ));
            }
        }
        OnboardingStep::ActualOwners => {
            if data.actual_owners.is_empty() {
                issues.push(ValidationIssue::error(
                    "actualOwners",
                    "at least one beneficial owner is required",
                ));
            }
        }
        OnboardingStep::Consents => {
            if !data.consents.gdpr_consent {
                issues.push(ValidationIssue::error("consents.gdprConsent", "must be accepted"));
            }
            if !data.consents.terms_accepted {
                issues.push(ValidationIssue::error("consents.termsAccepted", "must be accepted"));
            }
        }
    }
    issues
}

/// Errors for fields the configuration made required beyond the defaults
fn configured_issues(data: &OnboardingData, fields: &ResolvedFields) -> Vec<ValidationIssue> {
    if fields.added_required.is_empty() {
        return Vec::new();
    }
    let json = data.to_json();
    fields
        .added_required
        .iter()
        .filter(|key| {
            let values = json_path::values_at(&json, key);
            values.is_empty() || values.iter().any(|v| json_path::is_blank(v))
        })
        .map(|key| ValidationIssue::error(key.as_str(), REQUIRED))
        .collect()
}

fn completion_for(data: &OnboardingData, step: OnboardingStep, issues: &[ValidationIssue]) -> u8 {
    match step {
        OnboardingStep::Fees => return 100,
        OnboardingStep::DeviceSelection => {
            // nothing chosen yet only warns, but nothing is done either
            return if data.device_selection.has_any_selection() {
                100
            } else {
                0
            };
        }
        OnboardingStep::AuthorizedPersons
            if data.authorized_persons.iter().any(|p| p.has_name()) =>
        {
            return 100
        }
        OnboardingStep::ActualOwners if data.actual_owners.iter().any(|o| o.has_name()) => {
            return 100
        }
        _ => {}
    }

    if issues.is_empty() {
        return 100;
    }
    let total = field_count(step);
    let errors = issues.iter().filter(|i| i.is_error()).count().min(total);
    ((total - errors) * 100 / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fields::StepFieldConfig;
    use crate::domain::onboarding::{AuthorizedPerson, BusinessLocation, ContactInfo};

    fn contact() -> ContactInfo {
        ContactInfo {
            first_name: "Jana".into(),
            last_name: "Novakova".into(),
            email: "jana@example.cz".into(),
            phone: "777123456".into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_contact_step_fails() {
        let validator = StepValidator::default();
        let result = validator.validate(&OnboardingData::default(), OnboardingStep::Contact);
        assert!(!result.is_valid);
        assert_eq!(result.error_count(), 4);
        assert_eq!(result.completion, 0);
    }

    #[test]
    fn invalid_email_is_an_error_short_phone_a_warning() {
        let mut data = OnboardingData::default();
        data.contact_info = ContactInfo {
            email: "jana@localhost".into(),
            phone: "1234".into(),
            ..contact()
        };
        let result = StepValidator::default().validate(&data, OnboardingStep::Contact);
        assert!(!result.is_valid);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warnings().count(), 1);
        assert_eq!(result.completion, 75);
    }

    #[test]
    fn complete_contact_is_valid() {
        let mut data = OnboardingData::default();
        data.contact_info = contact();
        let result = StepValidator::default().validate(&data, OnboardingStep::Contact);
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
        assert_eq!(result.completion, 100);
    }

    #[test]
    fn device_selection_only_warns() {
        let result =
            StepValidator::default().validate(&OnboardingData::default(), OnboardingStep::DeviceSelection);
        assert!(result.is_valid);
        assert_eq!(result.warnings().count(), 1);
        assert_eq!(result.completion, 0);

        let mut data = OnboardingData::default();
        data.device_selection.dynamic_cards.push(Default::default());
        let result = StepValidator::default().validate(&data, OnboardingStep::DeviceSelection);
        assert_eq!(result.completion, 100);
    }

    #[test]
    fn fees_step_always_passes() {
        let result = StepValidator::default().validate(&OnboardingData::default(), OnboardingStep::Fees);
        assert!(result.is_valid);
        assert_eq!(result.completion, 100);
    }

    #[test]
    fn locations_need_name_and_address() {
        let mut data = OnboardingData::default();
        let validator = StepValidator::default();
        assert!(!validator.is_valid(&data, OnboardingStep::Locations));

        data.business_locations.push(BusinessLocation::default());
        let result = validator.validate(&data, OnboardingStep::Locations);
        let fields: Vec<_> = result.errors().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["businessLocations[0].name", "businessLocations[0].address"]
        );
    }

    #[test]
    fn named_person_counts_as_complete() {
        let mut data = OnboardingData::default();
        data.authorized_persons
            .push(AuthorizedPerson::from_contact(&contact()));
        let result = StepValidator::default().validate(&data, OnboardingStep::AuthorizedPersons);
        assert!(result.is_valid);
        assert_eq!(result.completion, 100);
    }

    #[test]
    fn consents_need_both_mandatory_flags() {
        let mut data = OnboardingData::default();
        data.consents.gdpr_consent = true;
        let result = StepValidator::default().validate(&data, OnboardingStep::Consents);
        assert!(!result.is_valid);
        assert_eq!(result.completion, 50);
    }

    #[test]
    fn presentation_override_is_reported() {
        let validator =
            StepValidator::new(ValidationPolicy::default().with_override(OnboardingStep::Company));
        let result = validator.validate(&OnboardingData::default(), OnboardingStep::Company);
        assert!(result.is_valid);
        assert!(result.override_applied);
        assert!(result.error_count() > 0);

        let contact = validator.validate(&OnboardingData::default(), OnboardingStep::Contact);
        assert!(!contact.is_valid);
        assert!(!contact.override_applied);
    }

    #[test]
    fn configured_required_field_adds_error() {
        let config: StepFieldConfig = serde_json::from_value(serde_json::json!({
            "fields": [
                { "key": "companyInfo.dic", "label": "DIC", "type": "text", "required": true }
            ]
        }))
        .unwrap();
        let fields = resolve_step_fields(OnboardingStep::Company, Some(config));
        let result = StepValidator::default().validate_with_fields(&OnboardingData::default(), &fields);
        assert!(result
            .errors()
            .any(|i| i.field == "companyInfo.dic" && i.message == REQUIRED));
    }

    #[test]
    fn disabled_field_suppresses_builtin_error() {
        let config: StepFieldConfig = serde_json::from_value(serde_json::json!({
            "fields": [
                { "key": "contactInfo.phone", "label": "Phone", "type": "phone", "enabled": false }
            ]
        }))
        .unwrap();
        let mut data = OnboardingData::default();
        data.contact_info = ContactInfo {
            phone: String::new(),
            ..contact()
        };
        let fields = resolve_step_fields(OnboardingStep::Contact, Some(config));
        let result = StepValidator::default().validate_with_fields(&data, &fields);
        assert!(result.is_valid);
    }

    #[test]
    fn disabled_step_passes() {
        let fields = resolve_step_fields(
            OnboardingStep::Consents,
            Some(StepFieldConfig {
                enabled: false,
                fields: Vec::new(),
            }),
        );
        let result = StepValidator::default().validate_with_fields(&OnboardingData::default(), &fields);
        assert!(result.is_valid);
        assert_eq!(result.completion, 100);
    }

    #[test]
    fn index_is_stripped_from_field_pattern() {
        assert_eq!(field_pattern("businessLocations[12].name"), "businessLocations[].name");
        assert_eq!(field_pattern("contactInfo.email"), "contactInfo.email");
    }
}

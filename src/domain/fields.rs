//! Field configuration schema
//!
//! A step's field set comes either from the built-in defaults or from the
//! field-configuration collaborator. Configured descriptors override the
//! defaults by key; configured order wins, defaults the configuration does
//! not mention keep their relative order after it.

use serde::{Deserialize, Serialize};

use super::onboarding::OnboardingStep;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// What kind of input a field is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Number,
    Date,
    Select { options: Vec<SelectOption> },
    Checkbox,
}

/// One field of a step. `key` is a dotted path into the aggregate, `[]`
/// marks "every element" of an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl FieldDescriptor {
    fn new(key: &str, label: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required,
            enabled: true,
        }
    }
}

/// Configuration for one step as delivered by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFieldConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Default,
    Configured,
}

/// Effective field set of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFields {
    pub step: OnboardingStep,
    pub enabled: bool,
    pub source: FieldSource,
    pub fields: Vec<FieldDescriptor>,
    /// Keys the configuration made required that the defaults do not require
    pub added_required: Vec<String>,
}

impl ResolvedFields {
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.enabled && f.required)
            .map(|f| f.key.as_str())
    }
}

fn select(values: &[&str]) -> FieldKind {
    FieldKind::Select {
        options: values
            .iter()
            .map(|v| SelectOption {
                value: v.to_string(),
                label: v.to_string(),
            })
            .collect(),
    }
}

/// Built-in field set of a step
pub fn default_fields(step: OnboardingStep) -> Vec<FieldDescriptor> {
    use FieldKind::*;
    let f = FieldDescriptor::new;
    match step {
        OnboardingStep::Contact => vec![
            f("contactInfo.salutation", "Salutation", select(&["mr", "mrs"]), false),
            f("contactInfo.firstName", "First name", Text, true),
            f("contactInfo.lastName", "Last name", Text, true),
            f("contactInfo.email", "Email", Email, true),
            f("contactInfo.phone", "Phone", Phone, true),
            f("contactInfo.note", "Note", Text, false),
        ],
        OnboardingStep::Company => vec![
            f("companyInfo.ico", "Registration number", Text, true),
            f("companyInfo.dic", "Tax number", Text, false),
            f("companyInfo.vatNumber", "VAT number", Text, false),
            f("companyInfo.companyName", "Company name", Text, true),
            f(
                "companyInfo.registryType",
                "Legal form",
                select(&["public", "business", "other"]),
                true,
            ),
            f("companyInfo.contactAddressSameAsMain", "Contact address same as head office", Checkbox, false),
            f(
                "companyInfo.headOfficeEqualsOperatingAddress",
                "Head office is the operating address",
                Checkbox,
                false,
            ),
        ],
        OnboardingStep::Locations => vec![
            f("businessLocations[].name", "Location name", Text, true),
            f("businessLocations[].hasPOS", "Point of sale", Checkbox, false),
            f("businessLocations[].businessSubject", "Business subject", Text, false),
            f("businessLocations[].mccCode", "MCC", Text, false),
            f("businessLocations[].monthlyTurnover", "Monthly turnover", Number, false),
            f("businessLocations[].averageTransaction", "Average transaction", Number, false),
            f(
                "businessLocations[].seasonality",
                "Seasonality",
                select(&["yearRound", "seasonal", "irregular"]),
                false,
            ),
        ],
        OnboardingStep::DeviceSelection => vec![
            f("deviceSelection.selectedSolutions", "Solutions", Text, false),
            f("deviceSelection.note", "Note", Text, false),
        ],
        OnboardingStep::Fees => vec![
            f("fees.unifiedRate", "Card rate", Number, false),
        ],
        OnboardingStep::AuthorizedPersons => vec![
            f("authorizedPersons[].firstName", "First name", Text, true),
            f("authorizedPersons[].lastName", "Last name", Text, true),
            f("authorizedPersons[].birthDate", "Birth date", Date, false),
            f("authorizedPersons[].birthNumber", "Birth number", Text, false),
            f("authorizedPersons[].citizenship", "Citizenship", Text, false),
            f("authorizedPersons[].isPoliticallyExposed", "Politically exposed", Checkbox, false),
        ],
        OnboardingStep::ActualOwners => vec![
            f("actualOwners[].firstName", "First name", Text, true),
            f("actualOwners[].lastName", "Last name", Text, true),
            f("actualOwners[].birthDate", "Birth date", Date, false),
            f("actualOwners[].ownershipPercentage", "Ownership %", Number, false),
        ],
        OnboardingStep::Consents => vec![
            f("consents.gdprConsent", "Personal data processing", Checkbox, true),
            f("consents.termsAccepted", "Terms and conditions", Checkbox, true),
            f("consents.marketingConsent", "Marketing", Checkbox, false),
            f("consents.electronicCommunication", "Electronic communication", Checkbox, false),
        ],
    }
}

/// Merge a configured field set over the defaults of `step`
pub fn resolve_step_fields(
    step: OnboardingStep,
    configured: Option<StepFieldConfig>,
) -> ResolvedFields {
    let defaults = default_fields(step);
    let Some(config) = configured else {
        return ResolvedFields {
            step,
            enabled: true,
            source: FieldSource::Default,
            fields: defaults,
            added_required: Vec::new(),
        };
    };

    let added_required = config
        .fields
        .iter()
        .filter(|f| f.enabled && f.required)
        .filter(|f| {
            !defaults
                .iter()
                .any(|d| d.key == f.key && d.required && d.enabled)
        })
        .map(|f| f.key.clone())
        .collect();

    let mut fields = config.fields;
    for default in defaults {
        if !fields.iter().any(|f| f.key == default.key) {
            fields.push(default);
        }
    }

    ResolvedFields {
        step,
        enabled: config.enabled,
        source: FieldSource::Configured,
        fields,
        added_required,
    }
}

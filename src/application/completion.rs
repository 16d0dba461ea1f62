//! Completion tracker
//!
//! Works on the JSON projection of the aggregate so step definitions can be
//! declared as dotted paths. Completeness of a value is decided by its JSON
//! type, refined by the path it was found at.

use serde::Serialize;
use serde_json::Value;

use crate::domain::{OnboardingData, OnboardingStep};
use crate::shared::utills::json_path::{is_blank, leaf_name, value_at};
use crate::shared::validations::{
    has_min_length, is_valid_email, is_valid_phone, MIN_DIC_LENGTH, MIN_ICO_LENGTH,
};

/// Required paths of one step
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub step: OnboardingStep,
    pub required: Vec<&'static str>,
    /// Only complete once the wizard has shown the step
    pub requires_visit: bool,
}

impl StepDefinition {
    fn new(step: OnboardingStep, required: Vec<&'static str>) -> Self {
        Self {
            step,
            required,
            requires_visit: false,
        }
    }

    fn visit_gated(mut self) -> Self {
        self.requires_visit = true;
        self
    }
}

/// Fields counted for each step when no configuration says otherwise
pub fn default_definitions() -> Vec<StepDefinition> {
    use OnboardingStep::*;
    vec![
        StepDefinition::new(
            Contact,
            vec![
                "contactInfo.firstName",
                "contactInfo.lastName",
                "contactInfo.email",
                "contactInfo.phone",
            ],
        ),
        StepDefinition::new(
            Company,
            vec![
                "companyInfo.ico",
                "companyInfo.companyName",
                "companyInfo.headOfficeAddress",
                "companyInfo.contactPerson",
            ],
        ),
        StepDefinition::new(Locations, vec!["businessLocations"]),
        StepDefinition::new(DeviceSelection, vec!["deviceSelection.dynamicCards"]),
        StepDefinition::new(Fees, vec!["fees"]).visit_gated(),
        StepDefinition::new(AuthorizedPersons, vec!["authorizedPersons"]),
        StepDefinition::new(ActualOwners, vec!["actualOwners"]),
        StepDefinition::new(Consents, vec!["consents"]),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepProgress {
    pub step: OnboardingStep,
    pub completed_fields: usize,
    pub total_fields: usize,
    pub percentage: u8,
    pub is_complete: bool,
    /// Required paths that are not complete yet
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallProgress {
    pub steps: Vec<StepProgress>,
    pub completed_fields: usize,
    pub total_fields: usize,
    pub percentage: u8,
    pub completed_steps: usize,
    pub total_steps: usize,
}

pub struct CompletionTracker {
    definitions: Vec<StepDefinition>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new(default_definitions())
    }
}

impl CompletionTracker {
    pub fn new(definitions: Vec<StepDefinition>) -> Self {
        Self { definitions }
    }

    /// Filled and required field counts of one step.
    /// Returns `None` when `step` has no definition.
    pub fn step_progress(&self, data: &OnboardingData, step: OnboardingStep) -> Option<StepProgress> {
        let definition = self.definitions.iter().find(|d| d.step == step)?;
        Some(evaluate(definition, data, &data.to_json()))
    }

    /// Progress across all steps
    pub fn overall(&self, data: &OnboardingData) -> OverallProgress {
        let json = data.to_json();
        let steps: Vec<StepProgress> = self
            .definitions
            .iter()
            .map(|d| evaluate(d, data, &json))
            .collect();

        let completed_fields = steps.iter().map(|s| s.completed_fields).sum();
        let total_fields = steps.iter().map(|s| s.total_fields).sum();
        let completed_steps = steps.iter().filter(|s| s.is_complete).count();

        OverallProgress {
            completed_fields,
            total_fields,
            percentage: percentage(completed_fields, total_fields),
            completed_steps,
            total_steps: steps.len(),
            steps,
        }
    }
}

fn percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

fn evaluate(definition: &StepDefinition, data: &OnboardingData, json: &Value) -> StepProgress {
    let missing: Vec<String> = definition
        .required
        .iter()
        .filter(|path| !value_at(json, path).is_some_and(|v| is_field_complete(path, v)))
        .map(|path| path.to_string())
        .collect();

    let total_fields = definition.required.len();
    let completed_fields = total_fields - missing.len();
    let percentage = percentage(completed_fields, total_fields);
    let visited = !definition.requires_visit || data.has_visited(definition.step);

    StepProgress {
        step: definition.step,
        completed_fields,
        total_fields,
        percentage,
        is_complete: percentage == 100 && visited,
        missing,
    }
}

/// Type-directed completeness of the value found at `path`
pub fn is_field_complete(path: &str, value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) => true,
        Value::Number(n) => n.as_f64().is_some_and(|n| n >= 0.0),
        Value::String(s) => is_text_complete(path, s),
        Value::Array(items) => !items.is_empty() && items.iter().all(|item| is_element_complete(path, item)),
        Value::Object(map) => match object_kind(path) {
            ObjectKind::Address => is_address_complete(value),
            ObjectKind::ContactPerson => is_contact_person_complete(value),
            ObjectKind::Fees => ["regulatedCards", "unregulatedCards"]
                .iter()
                .all(|key| value.get(key).and_then(Value::as_f64).is_some_and(|r| r >= 0.0)),
            ObjectKind::Consents => ["gdprConsent", "termsAccepted"]
                .iter()
                .all(|key| value.get(key).and_then(Value::as_bool) == Some(true)),
            ObjectKind::Other => !map.is_empty(),
        },
    }
}

fn is_text_complete(path: &str, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    let leaf = leaf_name(path).to_ascii_lowercase();
    if leaf.contains("email") {
        is_valid_email(text)
    } else if leaf.contains("phone") {
        is_valid_phone(text)
    } else if leaf == "ico" {
        has_min_length(text, MIN_ICO_LENGTH)
    } else if leaf == "dic" {
        has_min_length(text, MIN_DIC_LENGTH)
    } else {
        true
    }
}

enum ObjectKind {
    Address,
    ContactPerson,
    Fees,
    Consents,
    Other,
}

fn object_kind(path: &str) -> ObjectKind {
    let leaf = leaf_name(path);
    if leaf.to_ascii_lowercase().ends_with("address") {
        ObjectKind::Address
    } else if leaf == "contactPerson" {
        ObjectKind::ContactPerson
    } else if leaf == "fees" {
        ObjectKind::Fees
    } else if leaf == "consents" {
        ObjectKind::Consents
    } else {
        ObjectKind::Other
    }
}

fn has_text(value: &Value, key: &str) -> bool {
    value.get(key).is_some_and(|v| !is_blank(v))
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn is_address_complete(value: &Value) -> bool {
    ["street", "city", "zipCode"].iter().all(|key| has_text(value, key))
}

fn is_contact_person_complete(value: &Value) -> bool {
    has_text(value, "firstName")
        && has_text(value, "lastName")
        && is_valid_email(text(value, "email"))
        && has_text(value, "phone")
}

fn is_element_complete(path: &str, item: &Value) -> bool {
    match path {
        "businessLocations" => {
            has_text(item, "name")
                && item.get("address").is_some_and(is_address_complete)
                && item.get("contactPerson").is_some_and(is_contact_person_complete)
                && item
                    .get("bankAccounts")
                    .and_then(Value::as_array)
                    .is_some_and(|accounts| {
                        accounts
                            .iter()
                            .any(|a| has_text(a, "iban") && has_text(a, "currency"))
                    })
        }
        "deviceSelection.dynamicCards" => {
            has_text(item, "name") && item.get("count").and_then(Value::as_u64).is_some_and(|c| c > 0)
        }
        "authorizedPersons" => ["firstName", "lastName", "birthDate", "birthNumber"]
            .iter()
            .all(|key| has_text(item, key)),
        "actualOwners" => {
            has_text(item, "firstName")
                && has_text(item, "lastName")
                && item
                    .get("ownershipPercentage")
                    .and_then(Value::as_f64)
                    .is_some_and(|p| p > 0.0)
        }
        _ => !is_blank(item),
    }
}

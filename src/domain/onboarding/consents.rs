//! Required agreements and signature metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignatureMethod {
    #[default]
    Electronic,
    Handwritten,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Consents {
    pub gdpr_consent: bool,
    pub terms_accepted: bool,
    pub marketing_consent: bool,
    pub electronic_communication: bool,
    pub signature_method: SignatureMethod,
    pub signature_date: Option<DateTime<Utc>>,
    /// Id of the signing authorized person (lookup only)
    pub signing_person_id: Option<String>,
}

impl Consents {
    /// Both mandatory agreements are given
    pub fn has_mandatory(&self) -> bool {
        self.gdpr_consent && self.terms_accepted
    }

    pub fn sign(&mut self, person_id: impl Into<String>, at: DateTime<Utc>) {
        self.signing_person_id = Some(person_id.into());
        self.signature_date = Some(at);
    }
}

//! Authorized persons and beneficial owners

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::company::Address;
use super::contact::{same_text, ContactInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    #[default]
    IdCard,
    Passport,
    #[serde(other)]
    Other,
}

/// Identity document of an authorized person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityDocument {
    pub document_type: DocumentType,
    pub number: String,
    pub valid_until: String,
    pub issued_by: String,
    pub issuing_country: String,
}

/// Person empowered to act on behalf of the merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizedPerson {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    pub birth_place: String,
    /// National identification number
    pub birth_number: String,
    pub citizenship: String,
    pub permanent_address: Address,
    pub is_politically_exposed: bool,
    #[serde(rename = "isUSCitizen")]
    pub is_us_citizen: bool,
    pub document: IdentityDocument,
    pub created_from_contact: bool,
}

impl Default for AuthorizedPerson {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            birth_date: String::new(),
            birth_place: String::new(),
            birth_number: String::new(),
            citizenship: "CZ".to_string(),
            permanent_address: Address::default(),
            is_politically_exposed: false,
            is_us_citizen: false,
            document: IdentityDocument::default(),
            created_from_contact: false,
        }
    }
}

impl AuthorizedPerson {
    pub fn from_contact(contact: &ContactInfo) -> Self {
        Self {
            first_name: contact.first_name.trim().to_string(),
            last_name: contact.last_name.trim().to_string(),
            email: contact.email.trim().to_string(),
            phone: contact.full_phone(),
            created_from_contact: true,
            ..Self::default()
        }
    }

    /// Same first name, last name and email as the contact
    pub fn matches_contact(&self, contact: &ContactInfo) -> bool {
        same_text(&self.first_name, &contact.first_name)
            && same_text(&self.last_name, &contact.last_name)
            && same_text(&self.email, &contact.email)
    }

    pub fn has_name(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }

    /// Take over the contact's identity fields, leaving everything else
    pub fn follow_contact(&mut self, contact: &ContactInfo) {
        self.first_name = contact.first_name.trim().to_string();
        self.last_name = contact.last_name.trim().to_string();
        self.email = contact.email.trim().to_string();
        self.phone = contact.full_phone();
    }
}

/// Beneficial owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActualOwner {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    pub birth_number: String,
    pub citizenship: String,
    pub permanent_address: Address,
    pub ownership_percentage: f64,
    pub is_politically_exposed: bool,
    #[serde(rename = "isUSCitizen")]
    pub is_us_citizen: bool,
    pub created_from_contact: bool,
}

impl Default for ActualOwner {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            birth_date: String::new(),
            birth_number: String::new(),
            citizenship: "CZ".to_string(),
            permanent_address: Address::default(),
            ownership_percentage: 100.0,
            is_politically_exposed: false,
            is_us_citizen: false,
            created_from_contact: false,
        }
    }
}

impl ActualOwner {
    pub fn from_contact(contact: &ContactInfo) -> Self {
        Self {
            first_name: contact.first_name.trim().to_string(),
            last_name: contact.last_name.trim().to_string(),
            created_from_contact: true,
            ..Self::default()
        }
    }

    /// Same first and last name as the contact
    pub fn matches_contact(&self, contact: &ContactInfo) -> bool {
        same_text(&self.first_name, &contact.first_name)
            && same_text(&self.last_name, &contact.last_name)
    }

    pub fn has_name(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }

    pub fn follow_contact(&mut self, contact: &ContactInfo) {
        self.first_name = contact.first_name.trim().to_string();
        self.last_name = contact.last_name.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactInfo {
        ContactInfo {
            first_name: "Petr".into(),
            last_name: "Svoboda".into(),
            email: "petr@svoboda.cz".into(),
            phone: "602000111".into(),
            ..Default::default()
        }
    }

    #[test]
    fn derived_person_matches_contact_case_insensitively() {
        let person = AuthorizedPerson::from_contact(&contact());
        assert!(person.created_from_contact);
        assert_eq!(person.phone, "+420 602000111");

        let mut shouted = contact();
        shouted.first_name = " PETR ".into();
        shouted.email = "PETR@svoboda.cz".into();
        assert!(person.matches_contact(&shouted));
    }

    #[test]
    fn authorized_person_match_includes_email() {
        let person = AuthorizedPerson::from_contact(&contact());
        let mut other = contact();
        other.email = "jiny@svoboda.cz".into();
        assert!(!person.matches_contact(&other));

        let owner = ActualOwner::from_contact(&contact());
        assert!(owner.matches_contact(&other));
    }
}

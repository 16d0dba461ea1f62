//! Contact person of the onboarding session

use serde::{Deserialize, Serialize};

use crate::shared::validations::{is_valid_email, is_valid_phone};

/// Role the contact person plays towards the merchant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    AuthorizedPerson,
    ActualOwner,
    ContactPerson,
    TechnicalContact,
    #[serde(other)]
    Other,
}

/// The person filling in the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub salutation: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_prefix: String,
    pub phone: String,
    pub user_roles: Vec<UserRole>,
    pub note: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            salutation: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone_prefix: "+420".to_string(),
            phone: String::new(),
            user_roles: Vec::new(),
            note: String::new(),
        }
    }
}

impl ContactInfo {
    /// First name, last name, a well-formed email and a phone are all present.
    ///
    /// This is the point from which authorized persons and owners can be
    /// derived from the contact.
    pub fn is_basic_complete(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && is_valid_email(&self.email)
            && !self.phone.trim().is_empty()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.user_roles.contains(&role)
    }

    /// Contact person record carrying the same identity
    pub fn as_contact_person(&self) -> ContactPerson {
        ContactPerson {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.full_phone(),
        }
    }

    /// Phone with the country prefix, unless the number already carries one
    pub fn full_phone(&self) -> String {
        let phone = self.phone.trim();
        if phone.is_empty() || phone.starts_with('+') || self.phone_prefix.is_empty() {
            phone.to_string()
        } else {
            format!("{} {}", self.phone_prefix, phone)
        }
    }
}

/// Contact person attached to the company or to a business location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactPerson {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl ContactPerson {
    pub fn is_empty(&self) -> bool {
        self.first_name.trim().is_empty()
            && self.last_name.trim().is_empty()
            && self.email.trim().is_empty()
            && self.phone.trim().is_empty()
    }

    /// Name, valid email and valid phone
    pub fn is_complete(&self) -> bool {
        !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
            && is_valid_email(&self.email)
            && is_valid_phone(&self.phone)
    }
}

/// Case-insensitive, whitespace-tolerant comparison used for name/email matching
pub fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn basic_complete_requires_valid_email() {
        let mut c = contact();
        assert!(c.is_basic_complete());

        c.email = "jana.example.cz".into();
        assert!(!c.is_basic_complete());
    }

    #[test]
    fn full_phone_prepends_prefix_once() {
        let mut c = contact();
        assert_eq!(c.full_phone(), "+420 777123456");

        c.phone = "+421 900111222".into();
        assert_eq!(c.full_phone(), "+421 900111222");
    }

    #[test]
    fn contact_person_from_contact_is_complete() {
        assert!(contact().as_contact_person().is_complete());
        assert!(ContactPerson::default().is_empty());
    }

    #[test]
    fn unknown_role_deserializes_as_other() {
        let roles: Vec<UserRole> =
            serde_json::from_str(r#"["authorizedPerson","boardMember"]"#).unwrap();
        assert_eq!(roles, vec![UserRole::AuthorizedPerson, UserRole::Other]);
    }
}

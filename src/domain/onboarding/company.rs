//! Legal entity data

use serde::{Deserialize, Serialize};

use super::contact::ContactPerson;
use crate::domain::ports::CompanyCandidate;

/// Postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: String::new(),
            city: String::new(),
            zip_code: String::new(),
            country: "CZ".to_string(),
        }
    }
}

impl Address {
    /// Street, city and zip code are all filled in
    pub fn is_complete(&self) -> bool {
        !self.street.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.zip_code.trim().is_empty()
    }

    /// Nothing but the country is filled in
    pub fn is_blank(&self) -> bool {
        self.street.trim().is_empty()
            && self.city.trim().is_empty()
            && self.zip_code.trim().is_empty()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} {}", self.street, self.zip_code, self.city)
    }
}

/// Legal form of the merchant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryType {
    /// Entered in the public commercial register
    Public,
    /// Sole trader with a trade license
    #[default]
    Business,
    /// Associations, foundations and other nonprofit registers
    Other,
}

impl std::fmt::Display for RegistryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Business => write!(f, "business"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommercialRegister {
    pub court: String,
    pub section: String,
    pub insert_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeLicense {
    pub trade_office: String,
    pub license_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NonprofitRegister {
    pub register_name: String,
    pub registration_number: String,
}

/// Registration details, shape depends on the legal form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RegistrationInfo {
    CommercialRegister(CommercialRegister),
    TradeLicense(TradeLicense),
    NonprofitRegister(NonprofitRegister),
}

impl RegistrationInfo {
    /// Empty registration record of the shape the legal form requires
    pub fn empty_for(registry_type: RegistryType) -> Self {
        match registry_type {
            RegistryType::Public => Self::CommercialRegister(CommercialRegister::default()),
            RegistryType::Business => Self::TradeLicense(TradeLicense::default()),
            RegistryType::Other => Self::NonprofitRegister(NonprofitRegister::default()),
        }
    }

    pub fn matches(&self, registry_type: RegistryType) -> bool {
        matches!(
            (self, registry_type),
            (Self::CommercialRegister(_), RegistryType::Public)
                | (Self::TradeLicense(_), RegistryType::Business)
                | (Self::NonprofitRegister(_), RegistryType::Other)
        )
    }
}

/// Legal entity of the merchant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
    /// Registration number
    pub ico: String,
    /// Tax identification number
    pub dic: String,
    pub vat_number: String,
    pub company_name: String,
    pub registry_type: RegistryType,
    pub head_office_address: Address,
    pub contact_address: Option<Address>,
    pub contact_address_same_as_main: bool,
    pub head_office_equals_operating_address: bool,
    pub contact_person: ContactPerson,
    pub registration_info: Option<RegistrationInfo>,
}

impl CompanyInfo {
    /// Switch the legal form, swapping the registration variant when it no
    /// longer fits.
    pub fn set_registry_type(&mut self, registry_type: RegistryType) {
        self.registry_type = registry_type;
        let fits = self
            .registration_info
            .as_ref()
            .map(|info| info.matches(registry_type))
            .unwrap_or(false);
        if !fits {
            self.registration_info = Some(RegistrationInfo::empty_for(registry_type));
        }
    }

    /// Copy a registry search hit into the record.
    ///
    /// Fields the candidate does not carry are left as they are.
    pub fn apply_candidate(&mut self, candidate: &CompanyCandidate) {
        self.ico = candidate.ico.clone();
        if let Some(dic) = &candidate.dic {
            self.dic = dic.clone();
        }
        self.company_name = candidate.name.clone();
        if let Some(address) = &candidate.address {
            self.head_office_address = address.clone();
        }
        if let Some(registry_type) = candidate.registry_type {
            self.set_registry_type(registry_type);
        }
    }
}

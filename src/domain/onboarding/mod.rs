//! Onboarding aggregate and its sub-records

pub mod company;
pub mod consents;
pub mod contact;
pub mod device;
pub mod fees;
pub mod location;
pub mod model;
pub mod partial;
pub mod person;
pub mod step;

pub use company::{
    Address, CommercialRegister, CompanyInfo, NonprofitRegister, RegistrationInfo, RegistryType,
    TradeLicense,
};
pub use consents::{Consents, SignatureMethod};
pub use contact::{ContactInfo, ContactPerson, UserRole};
pub use device::{Addon, CardKind, DeviceSelection, DynamicCard};
pub use fees::{CalculatorResults, Fees};
pub use location::{
    default_week, BankAccount, BankAccountFormat, BusinessLocation, OpeningHours, Seasonality,
};
pub use model::{OnboardingData, SCHEMA_VERSION};
pub use partial::{PartialOnboardingData, Section};
pub use person::{ActualOwner, AuthorizedPerson, DocumentType, IdentityDocument};
pub use step::OnboardingStep;

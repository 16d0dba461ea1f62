//! Onboarding domain: the aggregate, its field schema and the ports to the
//! collaborators around the engine

pub mod fields;
pub mod onboarding;
pub mod ports;

// Re-export commonly used types
pub use fields::{FieldDescriptor, FieldKind, ResolvedFields, StepFieldConfig};
pub use onboarding::{
    OnboardingData, OnboardingStep, PartialOnboardingData, Section, SCHEMA_VERSION,
};
pub use ports::{CompanyCandidate, CompanyRegistry, FieldConfigSource, Notifier, RemoteSaver};

// Re-export errors from shared for convenience
pub use crate::shared::{DomainError, DomainResult};

//! Application layer: the store, the derivations reacting to it and the
//! session that wires them together

pub mod autofill;
pub mod completion;
pub mod persistence;
pub mod services;
pub mod session;
pub mod store;
pub mod validation;

// Re-export key types for convenience
pub use autofill::{AutoFill, AutoFillConfig};
pub use completion::{CompletionTracker, OverallProgress, StepDefinition, StepProgress};
pub use persistence::{
    AutoSaveConfig, AutoSaveState, AutoSaver, LocalCache, LocalCacheConfig, SaveOutcome,
};
pub use services::{CalculatorConfig, CalculatorInput, FeeCalculator};
pub use session::{OnboardingSession, SessionBuilder, SessionSettings};
pub use store::{OnboardingStore, StoreSnapshot, UpdateOutcome};
pub use validation::{
    Severity, StepValidation, StepValidator, ValidationIssue, ValidationPolicy,
};

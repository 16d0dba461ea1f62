//! # Onboarding Engine
//!
//! State engine behind a multi-step merchant onboarding wizard: one
//! aggregate of everything the merchant entered, a partial-update
//! contract, per-step validation and completion tracking, auto-fill of
//! derived records, local and remote persistence, and the fee/profit
//! calculator.
//!
//! ## Architecture
//!
//! - **domain**: The aggregate, its field schema and the collaborator ports
//! - **application**: Store, validation, completion, auto-fill, calculator,
//!   persistence and the session wiring them together
//! - **infrastructure**: Local storage backends
//! - **notifications**: Typed change events and the broadcast bus
//! - **shared**: Errors, shutdown signalling, debouncing, field checks

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod shared;
pub mod telemetry;

pub use config::{default_config_path, AppConfig};

pub use application::{OnboardingSession, OnboardingStore, SessionSettings};
pub use domain::{OnboardingData, OnboardingStep, PartialOnboardingData};
pub use notifications::{create_event_bus, EventBus, OnboardingEvent, SharedEventBus};

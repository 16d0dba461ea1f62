//! Outbound ports, the collaborators the engine calls out to
//!
//! Rendering, registry search, field configuration loading and toast display
//! live outside the engine. It only sees them through these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::domain::fields::StepFieldConfig;
use crate::domain::onboarding::{OnboardingData, OnboardingStep, RegistryType};
use crate::domain::onboarding::Address;
use crate::shared::{InfraResult, RemoteSaveError};

// ── RemoteSaver ────────────────────────────────────────────────

/// Remote persistence of the whole aggregate under a session id.
///
/// Failures propagate to the caller; retrying is the implementor's business.
#[async_trait]
pub trait RemoteSaver: Send + Sync {
    async fn save(&self, session_id: &str, data: &OnboardingData) -> Result<(), RemoteSaveError>;
}

// ── CompanyRegistry ────────────────────────────────────────────

/// A company as returned by the registry search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCandidate {
    pub ico: String,
    pub dic: Option<String>,
    pub name: String,
    pub address: Option<Address>,
    pub registry_type: Option<RegistryType>,
}

/// Read-only company registry.
///
/// Caching, retries and fallback suggestions are expected to happen inside
/// the implementation.
#[async_trait]
pub trait CompanyRegistry: Send + Sync {
    async fn search(&self, query: &str) -> InfraResult<Vec<CompanyCandidate>>;
    async fn get_by_identifier(&self, ico: &str) -> InfraResult<Option<CompanyCandidate>>;
}

// ── FieldConfigSource ──────────────────────────────────────────

/// Supplier of per-step field configuration.
///
/// `None` means "not configured"; the built-in field set applies.
#[async_trait]
pub trait FieldConfigSource: Send + Sync {
    async fn step_config(&self, step: OnboardingStep) -> Option<StepFieldConfig>;
}

// ── Notifier ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Human-readable notice for the error-surfacing collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Receives failure notices; must not influence control flow
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => info!(title = %notification.title, "{}", notification.message),
            NotificationLevel::Warning => {
                warn!(title = %notification.title, "{}", notification.message)
            }
            NotificationLevel::Error => {
                error!(title = %notification.title, "{}", notification.message)
            }
        }
    }
}

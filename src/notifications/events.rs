//! Onboarding events
//!
//! Every change of the aggregate and every persistence status change is
//! published as one of these events. Subscribers re-read the current
//! aggregate from the store rather than relying on event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Section;

/// Who caused a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateOrigin {
    /// A wizard edit
    User,
    /// The auto-fill propagator
    AutoFill,
    /// The fee calculator writing back its results
    Calculator,
    /// Snapshot loaded from durable storage
    Load,
    /// Explicit clear after submission or deletion
    Reset,
}

impl std::fmt::Display for UpdateOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::AutoFill => write!(f, "autoFill"),
            Self::Calculator => write!(f, "calculator"),
            Self::Load => write!(f, "load"),
            Self::Reset => write!(f, "reset"),
        }
    }
}

/// Remote auto-save status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl std::fmt::Display for AutoSaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Saving => write!(f, "saving"),
            Self::Saved => write!(f, "saved"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Event types published on the session bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OnboardingEvent {
    /// Sections of the aggregate changed through the update contract
    DataUpdated(DataUpdatedEvent),
    /// The whole aggregate was replaced (load or reset)
    DataReplaced(DataReplacedEvent),
    /// Remote auto-save moved to a new status
    AutoSaveStatusChanged(AutoSaveStatusEvent),
    /// Local cache write failed even after recovery
    LocalSaveFailed(LocalSaveFailedEvent),
}

impl OnboardingEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::DataUpdated(_) => "data_updated",
            Self::DataReplaced(_) => "data_replaced",
            Self::AutoSaveStatusChanged(_) => "auto_save_status_changed",
            Self::LocalSaveFailed(_) => "local_save_failed",
        }
    }

    /// Revision of the aggregate the event refers to, if any
    pub fn revision(&self) -> Option<u64> {
        match self {
            Self::DataUpdated(e) => Some(e.revision),
            Self::DataReplaced(e) => Some(e.revision),
            _ => None,
        }
    }

    /// The aggregate changed (update or replace)
    pub fn is_data_change(&self) -> bool {
        matches!(self, Self::DataUpdated(_) | Self::DataReplaced(_))
    }

    /// The change must reach the local cache without debounce
    pub fn is_critical(&self) -> bool {
        match self {
            Self::DataUpdated(e) => e.critical,
            Self::DataReplaced(_) => true,
            _ => false,
        }
    }

    pub fn touches(&self, section: Section) -> bool {
        match self {
            Self::DataUpdated(e) => e.sections.contains(&section),
            Self::DataReplaced(_) => true,
            _ => false,
        }
    }

    pub fn origin(&self) -> Option<UpdateOrigin> {
        match self {
            Self::DataUpdated(e) => Some(e.origin),
            Self::DataReplaced(e) => Some(e.origin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataUpdatedEvent {
    pub revision: u64,
    pub origin: UpdateOrigin,
    pub sections: Vec<Section>,
    pub critical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataReplacedEvent {
    pub revision: u64,
    pub origin: UpdateOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSaveStatusEvent {
    pub status: AutoSaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSaveFailedEvent {
    pub error: String,
}

/// Event with id and timestamp, as delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: OnboardingEvent,
}

impl EventMessage {
    pub fn new(event: OnboardingEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_message_serializes_tagged() {
        let message = EventMessage::new(OnboardingEvent::DataUpdated(DataUpdatedEvent {
            revision: 3,
            origin: UpdateOrigin::User,
            sections: vec![Section::ContactInfo],
            critical: true,
        }));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "DataUpdated");
        assert_eq!(json["data"]["revision"], 3);
        assert_eq!(json["data"]["sections"][0], "contactInfo");
        assert_eq!(json["data"]["origin"], "user");
    }

    #[test]
    fn replaced_is_critical_and_touches_everything() {
        let event = OnboardingEvent::DataReplaced(DataReplacedEvent {
            revision: 1,
            origin: UpdateOrigin::Load,
        });
        assert!(event.is_critical());
        assert!(event.touches(Section::Fees));
        assert_eq!(event.revision(), Some(1));
    }
}

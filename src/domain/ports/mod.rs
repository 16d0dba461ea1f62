//! Domain ports (hexagonal architecture boundaries)
//!
//! Ports define the interfaces between the onboarding engine and the
//! collaborators around it. Local durable storage has its own trait in
//! `infrastructure::storage`.

pub mod outbound;

pub use outbound::{
    CompanyCandidate, CompanyRegistry, FieldConfigSource, Notification, NotificationLevel,
    Notifier, RemoteSaver, TracingNotifier,
};

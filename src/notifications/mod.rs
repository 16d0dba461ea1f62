//! Notifications module
//!
//! Typed events describing changes of the onboarding aggregate, and the
//! broadcast bus the session's reactors subscribe to.
//!
//! # Usage
//! ```ignore
//! use onboarding_engine::notifications::{create_event_bus, OnboardingEvent};
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe();
//! while let Some(message) = subscriber.recv().await {
//!     if message.event.is_data_change() {
//!         // re-read the aggregate and react
//!     }
//! }
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;

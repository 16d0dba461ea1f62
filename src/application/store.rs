//! Onboarding store: owner of the aggregate and its update contract
//!
//! The aggregate is held behind an `Arc` that is swapped, never mutated:
//! every accepted update produces a new value and bumps the revision.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{
    DomainError, DomainResult, OnboardingData, OnboardingStep, PartialOnboardingData, Section,
};
use crate::notifications::{
    DataReplacedEvent, DataUpdatedEvent, OnboardingEvent, SharedEventBus, UpdateOrigin,
};

/// Result of one call to the update contract
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub data: Arc<OnboardingData>,
    pub revision: u64,
    /// Sections whose value actually changed
    pub changed: Vec<Section>,
    /// Contact, locations, devices, fees or session id changed
    pub critical: bool,
}

impl UpdateOutcome {
    /// Nothing changed, no revision was spent and no event went out
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Aggregate with the revisions it was read at
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub data: Arc<OnboardingData>,
    pub revision: u64,
    /// Revision of the last whole-aggregate replace; changes below it are gone
    pub replaced_at: u64,
}

struct StoreState {
    data: Arc<OnboardingData>,
    revision: u64,
    replaced_at: u64,
}

pub struct OnboardingStore {
    state: RwLock<StoreState>,
    events: SharedEventBus,
}

impl OnboardingStore {
    /// Store holding `initial` at revision 0
    pub fn new(initial: OnboardingData, events: SharedEventBus) -> Self {
        Self {
            state: RwLock::new(StoreState {
                data: Arc::new(initial),
                revision: 0,
                replaced_at: 0,
            }),
            events,
        }
    }

    /// Current aggregate; cheap, it only clones the `Arc`
    pub async fn snapshot(&self) -> Arc<OnboardingData> {
        self.state.read().await.data.clone()
    }

    /// Number of accepted changes; 0 for a fresh store
    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }

    /// Aggregate and its revisions, read under one lock
    pub async fn stamped_snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            data: state.data.clone(),
            revision: state.revision,
            replaced_at: state.replaced_at,
        }
    }

    /// Shallow-merge `partial` into the aggregate.
    ///
    /// Supplied locations get their legacy mirrors re-derived from the
    /// structured fields and a supplied fee record gets its legacy rates
    /// mirrored. Legacy upgrades only run when a snapshot is loaded. Fails with
    /// `AddressLocked` when the first location's address would move away
    /// from the head-office address while the two are linked.
    pub async fn update(
        &self,
        partial: PartialOnboardingData,
        origin: UpdateOrigin,
    ) -> DomainResult<UpdateOutcome> {
        let mut state = self.state.write().await;
        self.apply(&mut state, partial, origin)
    }

    /// Compute a partial update from the current aggregate and apply it
    /// under the same lock, so no other write can land in between.
    ///
    /// Returns `None` when `f` has nothing to change.
    pub async fn update_with<F>(
        &self,
        origin: UpdateOrigin,
        f: F,
    ) -> DomainResult<Option<UpdateOutcome>>
    where
        F: FnOnce(&OnboardingData) -> Option<PartialOnboardingData>,
    {
        let mut state = self.state.write().await;
        let Some(partial) = f(&state.data) else {
            return Ok(None);
        };
        self.apply(&mut state, partial, origin).map(Some)
    }

    fn apply(
        &self,
        state: &mut StoreState,
        partial: PartialOnboardingData,
        origin: UpdateOrigin,
    ) -> DomainResult<UpdateOutcome> {
        if let Some(step) = partial.current_step {
            if OnboardingStep::from_index(step).is_none() {
                return Err(DomainError::UnknownStep(step));
            }
        }

        let current = state.data.clone();
        let touches_locations = partial.business_locations.is_some();
        let touches_fees = partial.fees.is_some();
        let mut next = current.merge(partial);
        if touches_locations {
            for location in next.business_locations.iter_mut() {
                location.sync_legacy_fields();
            }
        }
        if touches_fees {
            next.fees.sync_legacy_rates();
        }

        if let Err(e) = check_address_lock(&current, &next) {
            warn!(%origin, "Rejected edit of linked operating address");
            return Err(e);
        }

        let changed = current.diff_sections(&next);
        if changed.is_empty() {
            return Ok(UpdateOutcome {
                data: current,
                revision: state.revision,
                changed,
                critical: false,
            });
        }

        let critical = changed.iter().any(|s| s.is_critical());
        state.revision += 1;
        state.data = Arc::new(next);
        let outcome = UpdateOutcome {
            data: state.data.clone(),
            revision: state.revision,
            changed,
            critical,
        };

        debug!(
            revision = outcome.revision,
            %origin,
            critical,
            sections = ?outcome.changed,
            "Onboarding data updated"
        );
        self.events
            .publish(OnboardingEvent::DataUpdated(DataUpdatedEvent {
                revision: outcome.revision,
                origin,
                sections: outcome.changed.clone(),
                critical,
            }));

        Ok(outcome)
    }

    /// Swap in a whole aggregate (snapshot load or reset to defaults).
    /// Returns the revision the new aggregate was stored under.
    pub async fn replace(&self, data: OnboardingData, origin: UpdateOrigin) -> u64 {
        let mut state = self.state.write().await;
        state.revision += 1;
        state.replaced_at = state.revision;
        state.data = Arc::new(data);
        let revision = state.revision;
        drop(state);

        debug!(revision, %origin, "Onboarding data replaced");
        self.events
            .publish(OnboardingEvent::DataReplaced(DataReplacedEvent { revision, origin }));
        revision
    }

    /// Discard the aggregate in favour of fresh defaults
    pub async fn reset(&self) -> u64 {
        self.replace(OnboardingData::default(), UpdateOrigin::Reset)
            .await
    }

    /// Move the wizard to `step` and mark it visited.
    ///
    /// The visited set is extended under the write lock, so concurrent
    /// step changes never drop each other's marks.
    pub async fn set_current_step(&self, step: OnboardingStep) -> DomainResult<UpdateOutcome> {
        let mut state = self.state.write().await;
        let mut visited = state.data.visited_steps.clone();
        visited.insert(step.index());
        let partial = PartialOnboardingData {
            current_step: Some(step.index()),
            visited_steps: Some(visited),
            ..Default::default()
        };
        self.apply(&mut state, partial, UpdateOrigin::User)
    }
}

/// While the head office is the operating address, the first location's
/// address may only change towards the head-office address.
fn check_address_lock(current: &OnboardingData, next: &OnboardingData) -> DomainResult<()> {
    if !current.company_info.head_office_equals_operating_address
        || !next.company_info.head_office_equals_operating_address
    {
        return Ok(());
    }
    let (Some(before), Some(after)) = (
        current.business_locations.first(),
        next.business_locations.first(),
    ) else {
        return Ok(());
    };
    if before.id != after.id || before.address == after.address {
        return Ok(());
    }
    if after.address == next.company_info.head_office_address {
        return Ok(());
    }
    Err(DomainError::AddressLocked)
}

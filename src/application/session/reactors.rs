//! Background reactors of an onboarding session
//!
//! Each reactor is one task listening on the session's event bus. Events
//! carry no data; a reactor re-reads the current aggregate and recomputes
//! its own output from it.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::application::autofill::AutoFill;
use crate::application::persistence::{AutoSaver, LocalCache};
use crate::application::services::FeeCalculator;
use crate::application::store::OnboardingStore;
use crate::domain::{PartialOnboardingData, Section};
use crate::notifications::{EventSubscriber, OnboardingEvent, UpdateOrigin};
use crate::shared::{Debouncer, ShutdownSignal};

/// Run `handle` for every event until the bus closes or shutdown fires
fn spawn_reactor<F, Fut>(
    name: &'static str,
    mut subscriber: EventSubscriber,
    shutdown: ShutdownSignal,
    mut handle: F,
) -> JoinHandle<()>
where
    F: FnMut(OnboardingEvent) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        debug!(reactor = name, "Reactor started");
        loop {
            tokio::select! {
                message = subscriber.recv() => match message {
                    Some(message) => handle(message.event).await,
                    None => break,
                },
                _ = shutdown.notified().wait() => break,
            }
        }
        debug!(reactor = name, "Reactor stopped");
    })
}

/// Local cache on every change (critical ones immediately), remote
/// auto-save debounced
pub(super) fn spawn_persistence(
    store: Arc<OnboardingStore>,
    subscriber: EventSubscriber,
    shutdown: ShutdownSignal,
    local: Arc<LocalCache>,
    auto_saver: Option<Arc<AutoSaver>>,
) -> JoinHandle<()> {
    spawn_reactor("persistence", subscriber, shutdown, move |event| {
        let store = store.clone();
        let local = local.clone();
        let auto_saver = auto_saver.clone();
        async move {
            if !event.is_data_change()
                || matches!(event.origin(), Some(UpdateOrigin::Load | UpdateOrigin::Reset))
            {
                return;
            }
            let snapshot = store.stamped_snapshot().await;
            if event
                .revision()
                .is_some_and(|revision| revision < snapshot.replaced_at)
            {
                debug!(
                    revision = ?event.revision(),
                    replaced_at = snapshot.replaced_at,
                    "Dropped change superseded by a replace"
                );
                return;
            }
            let data = snapshot.data;
            if let Err(e) = local
                .save(data.clone(), snapshot.revision, event.is_critical())
                .await
            {
                warn!(error = %e, "Local cache write failed");
            }
            if let Some(auto_saver) = auto_saver {
                auto_saver.schedule(data);
            }
        }
    })
}

pub(super) fn spawn_auto_fill(
    store: Arc<OnboardingStore>,
    subscriber: EventSubscriber,
    shutdown: ShutdownSignal,
    auto_fill: Arc<Mutex<AutoFill>>,
    timer: Arc<Debouncer>,
) -> JoinHandle<()> {
    spawn_reactor("auto_fill", subscriber, shutdown, move |event| {
        let store = store.clone();
        let auto_fill = auto_fill.clone();
        let timer = timer.clone();
        async move {
            match &event {
                OnboardingEvent::DataReplaced(_) => {
                    // loaded or reset data is the new baseline, not an edit
                    timer.cancel();
                    let data = store.snapshot().await;
                    lock(&auto_fill).prime(&data);
                    return;
                }
                OnboardingEvent::DataUpdated(e) if e.origin != UpdateOrigin::AutoFill => {}
                _ => return,
            }

            timer.schedule(async move {
                let result = store
                    .update_with(UpdateOrigin::AutoFill, |data| lock(&auto_fill).react(data))
                    .await;
                if let Err(e) = result {
                    warn!(error = %e, "Auto-fill update rejected");
                }
            });
        }
    })
}

pub(super) fn spawn_calculator(
    store: Arc<OnboardingStore>,
    subscriber: EventSubscriber,
    shutdown: ShutdownSignal,
    calculator: Arc<FeeCalculator>,
    timer: Arc<Debouncer>,
) -> JoinHandle<()> {
    spawn_reactor("calculator", subscriber, shutdown, move |event| {
        let store = store.clone();
        let calculator = calculator.clone();
        let timer = timer.clone();
        async move {
            let relevant = [Section::BusinessLocations, Section::DeviceSelection, Section::Fees]
                .into_iter()
                .any(|section| event.touches(section));
            if !relevant
                || matches!(
                    event.origin(),
                    Some(UpdateOrigin::Calculator | UpdateOrigin::Reset)
                )
            {
                return;
            }

            timer.schedule(async move {
                let result = store
                    .update_with(UpdateOrigin::Calculator, |data| {
                        calculator
                            .recompute(data)
                            .map(|fees| PartialOnboardingData::default().with_fees(fees))
                    })
                    .await;
                if let Err(e) = result {
                    warn!(error = %e, "Fee calculator update rejected");
                }
            });
        }
    })
}

fn lock(auto_fill: &Mutex<AutoFill>) -> std::sync::MutexGuard<'_, AutoFill> {
    auto_fill.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! Onboarding session
//!
//! Explicitly owned context for one wizard run: the store, its event bus,
//! the persistence paths and the reactors deriving data from the aggregate.
//! Create it with [`OnboardingSession::builder`], mutate through
//! [`OnboardingSession::update`], and call [`OnboardingSession::dispose`]
//! when the wizard goes away so no timer fires against a dead session.

mod reactors;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::autofill::{AutoFill, AutoFillConfig};
use super::completion::{CompletionTracker, OverallProgress, StepProgress};
use super::persistence::{
    AutoSaveConfig, AutoSaveState, AutoSaver, LocalCache, LocalCacheConfig, SaveOutcome,
};
use super::services::{CalculatorConfig, FeeCalculator};
use super::store::{OnboardingStore, UpdateOutcome};
use super::validation::{StepValidation, StepValidator, ValidationPolicy};
use crate::domain::fields::resolve_step_fields;
use crate::domain::ports::{
    CompanyCandidate, CompanyRegistry, FieldConfigSource, Notifier, RemoteSaver, TracingNotifier,
};
use crate::domain::{DomainError, DomainResult, OnboardingData, OnboardingStep, PartialOnboardingData};
use crate::infrastructure::storage::LocalStore;
use crate::notifications::{create_event_bus, EventSubscriber, SharedEventBus, UpdateOrigin};
use crate::shared::{cleanup_within, Debouncer, InfraResult, RemoteSaveError, ShutdownSignal};

/// Tunables of a session, usually taken from the application config
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub local_cache: LocalCacheConfig,
    pub auto_save: AutoSaveConfig,
    pub calculator: CalculatorConfig,
    pub auto_fill: AutoFillConfig,
    pub validation: ValidationPolicy,
    /// How long `dispose` waits for reactor tasks to stop
    pub dispose_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            local_cache: LocalCacheConfig::default(),
            auto_save: AutoSaveConfig::default(),
            calculator: CalculatorConfig::default(),
            auto_fill: AutoFillConfig::default(),
            validation: ValidationPolicy::default(),
            dispose_timeout: Duration::from_secs(5),
        }
    }
}

pub struct SessionBuilder {
    local_store: Arc<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteSaver>>,
    field_config: Option<Arc<dyn FieldConfigSource>>,
    notifier: Arc<dyn Notifier>,
    settings: SessionSettings,
}

impl SessionBuilder {
    /// Save to this remote backend once a session id exists
    pub fn remote(mut self, remote: Arc<dyn RemoteSaver>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Per-step field configuration used by validation
    pub fn field_config(mut self, source: Arc<dyn FieldConfigSource>) -> Self {
        self.field_config = Some(source);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the default [`SessionSettings`]
    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Load the last snapshot (or start from defaults), migrate it and
    /// start the reactors
    pub async fn start(self) -> OnboardingSession {
        let events = create_event_bus();
        let settings = self.settings;

        let local = Arc::new(
            LocalCache::new(self.local_store, settings.local_cache.clone())
                .with_events(events.clone())
                .with_notifier(self.notifier.clone()),
        );
        let auto_saver = self.remote.map(|remote| {
            Arc::new(AutoSaver::new(
                remote,
                settings.auto_save.clone(),
                Some(events.clone()),
                Some(self.notifier.clone()),
            ))
        });

        let (data, migrated) = match local.load().await {
            Some(mut data) => {
                let migrated = data.migrate();
                (data, migrated)
            }
            None => (OnboardingData::default(), false),
        };

        let mut auto_fill = AutoFill::new(settings.auto_fill.clone());
        auto_fill.prime(&data);

        let store = Arc::new(OnboardingStore::new(data, events.clone()));
        if migrated {
            let snapshot = store.stamped_snapshot().await;
            if let Err(e) = local.save(snapshot.data, snapshot.revision, true).await {
                warn!(error = %e, "Could not persist migrated snapshot");
            }
        }

        let shutdown = ShutdownSignal::new();
        let timers = SessionTimers {
            auto_fill: Arc::new(Debouncer::new(
                "auto_fill",
                Duration::from_millis(settings.auto_fill.debounce_ms),
            )),
            calculator: Arc::new(Debouncer::new(
                "calculator",
                Duration::from_millis(settings.calculator.debounce_ms),
            )),
        };

        let tasks = vec![
            reactors::spawn_persistence(
                store.clone(),
                events.subscribe(),
                shutdown.clone(),
                local.clone(),
                auto_saver.clone(),
            ),
            reactors::spawn_auto_fill(
                store.clone(),
                events.subscribe(),
                shutdown.clone(),
                Arc::new(Mutex::new(auto_fill)),
                timers.auto_fill.clone(),
            ),
            reactors::spawn_calculator(
                store.clone(),
                events.subscribe(),
                shutdown.clone(),
                Arc::new(FeeCalculator::new(settings.calculator.clone())),
                timers.calculator.clone(),
            ),
        ];

        let session_id = store.snapshot().await.session_id.clone();
        info!(session_id = ?session_id, migrated, "Onboarding session started");

        OnboardingSession {
            validator: StepValidator::new(settings.validation.clone()),
            tracker: CompletionTracker::default(),
            field_config: self.field_config,
            store,
            events,
            local,
            auto_saver,
            shutdown,
            timers,
            tasks: Mutex::new(tasks),
            dispose_timeout: settings.dispose_timeout,
        }
    }
}

struct SessionTimers {
    auto_fill: Arc<Debouncer>,
    calculator: Arc<Debouncer>,
}

impl SessionTimers {
    fn cancel_all(&self) {
        self.auto_fill.cancel();
        self.calculator.cancel();
    }
}

pub struct OnboardingSession {
    store: Arc<OnboardingStore>,
    events: SharedEventBus,
    local: Arc<LocalCache>,
    auto_saver: Option<Arc<AutoSaver>>,
    validator: StepValidator,
    tracker: CompletionTracker,
    field_config: Option<Arc<dyn FieldConfigSource>>,
    shutdown: ShutdownSignal,
    timers: SessionTimers,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    dispose_timeout: Duration,
}

impl OnboardingSession {
    /// Start building a session persisting to `local_store`
    pub fn builder(local_store: Arc<dyn LocalStore>) -> SessionBuilder {
        SessionBuilder {
            local_store,
            remote: None,
            field_config: None,
            notifier: Arc::new(TracingNotifier),
            settings: SessionSettings::default(),
        }
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.shutdown.is_triggered() {
            return Err(DomainError::SessionClosed);
        }
        Ok(())
    }

    pub fn store(&self) -> &Arc<OnboardingStore> {
        &self.store
    }

    pub fn subscribe(&self) -> EventSubscriber {
        self.events.subscribe()
    }

    /// Current aggregate
    pub async fn snapshot(&self) -> Arc<OnboardingData> {
        self.store.snapshot().await
    }

    /// Apply `partial` as a user edit, see [`OnboardingStore::update`]
    pub async fn update(&self, partial: PartialOnboardingData) -> DomainResult<UpdateOutcome> {
        self.ensure_open()?;
        self.store.update(partial, UpdateOrigin::User).await
    }

    /// Move to `step` and mark it visited
    pub async fn set_step(&self, step: OnboardingStep) -> DomainResult<UpdateOutcome> {
        self.ensure_open()?;
        self.store.set_current_step(step).await
    }

    /// Store the server session id; remote auto-save starts from here
    pub async fn set_session_id(&self, session_id: impl Into<String>) -> DomainResult<UpdateOutcome> {
        self.update(PartialOnboardingData::default().with_session_id(Some(session_id.into())))
            .await
    }

    /// Validate a step against its configured field set
    pub async fn validate(&self, step: OnboardingStep) -> StepValidation {
        let config = match &self.field_config {
            Some(source) => source.step_config(step).await,
            None => None,
        };
        let fields = resolve_step_fields(step, config);
        self.validator
            .validate_with_fields(&*self.store.snapshot().await, &fields)
    }

    /// Validation of every step, in wizard order
    pub async fn validate_all(&self) -> Vec<StepValidation> {
        let mut results = Vec::with_capacity(OnboardingStep::COUNT);
        for step in OnboardingStep::ALL {
            results.push(self.validate(step).await);
        }
        results
    }

    pub async fn step_progress(&self, step: OnboardingStep) -> Option<StepProgress> {
        self.tracker.step_progress(&*self.store.snapshot().await, step)
    }

    pub async fn progress(&self) -> OverallProgress {
        self.tracker.overall(&*self.store.snapshot().await)
    }

    /// Copy a chosen registry candidate into the company record
    pub async fn apply_company(&self, candidate: &CompanyCandidate) -> DomainResult<UpdateOutcome> {
        self.ensure_open()?;
        let mut company = self.store.snapshot().await.company_info.clone();
        company.apply_candidate(candidate);
        self.store
            .update(
                PartialOnboardingData::default().with_company_info(company),
                UpdateOrigin::User,
            )
            .await
    }

    /// Look the company up by registration number and apply the hit.
    /// Returns `false` when the registry does not know the number.
    pub async fn fill_company_from_registry(
        &self,
        registry: &dyn CompanyRegistry,
        ico: &str,
    ) -> DomainResult<bool> {
        match registry.get_by_identifier(ico).await? {
            Some(candidate) => {
                self.apply_company(&candidate).await?;
                Ok(true)
            }
            None => {
                debug!(ico, "Company not found in registry");
                Ok(false)
            }
        }
    }

    pub fn auto_save_status(&self) -> Option<watch::Receiver<AutoSaveState>> {
        self.auto_saver.as_ref().map(|saver| saver.subscribe())
    }

    /// Explicit remote save, e.g. after the user dismissed an error
    pub async fn retry_auto_save(&self) -> Result<SaveOutcome, RemoteSaveError> {
        match &self.auto_saver {
            Some(saver) => saver.save_now(&*self.store.snapshot().await).await,
            None => Ok(SaveOutcome::NoSession),
        }
    }

    /// Write a pending local snapshot now
    pub async fn flush(&self) -> InfraResult<()> {
        self.local.flush().await
    }

    /// Reset to defaults, then back up and drop the local snapshot.
    ///
    /// Changes made before the reset whose local write is still queued are
    /// dropped rather than written back.
    pub async fn clear(&self) -> DomainResult<()> {
        self.ensure_open()?;
        self.timers.cancel_all();
        let revision = self.store.reset().await;
        self.local.clear(revision).await?;
        if let Some(saver) = &self.auto_saver {
            saver.reset().await;
        }
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Stop every reactor and cancel all pending timers. Pending local
    /// writes are dropped; call [`flush`](Self::flush) first to keep them.
    pub async fn dispose(&self) {
        if self.shutdown.is_triggered() {
            return;
        }
        self.shutdown.trigger();
        self.timers.cancel_all();
        self.local.cancel();
        if let Some(saver) = &self.auto_saver {
            saver.cancel();
        }

        let tasks = std::mem::take(
            &mut *self
                .tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        let stopped = cleanup_within(self.dispose_timeout, || async move {
            for task in tasks {
                let _ = task.await;
            }
        })
        .await;
        if !stopped {
            warn!("Reactors did not stop within {:?}", self.dispose_timeout);
        }
        info!("Onboarding session disposed");
    }
}

//! Remote auto-save
//!
//! Pushes the aggregate to the remote persistence collaborator while a
//! session id is set. Saves are debounced and skipped when the serialized
//! aggregate equals the last one saved. Failures are surfaced through the
//! status channel and the notifier; they are not retried here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::domain::ports::{Notification, Notifier, RemoteSaver, TracingNotifier};
use crate::domain::OnboardingData;
use crate::notifications::{AutoSaveStatus, AutoSaveStatusEvent, OnboardingEvent, SharedEventBus};
use crate::shared::{Debouncer, RemoteSaveError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    pub debounce_ms: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 2000,
        }
    }
}

/// Observable auto-save state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveState {
    pub status: AutoSaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Same serialized aggregate as the last successful save
    Unchanged,
    /// No session id yet, nothing to save under
    NoSession,
}

struct SaverInner {
    remote: Arc<dyn RemoteSaver>,
    notifier: Arc<dyn Notifier>,
    events: Option<SharedEventBus>,
    /// Serialized aggregate of the last successful save; the lock also
    /// keeps saves from overlapping
    last_saved: Mutex<Option<String>>,
    state: watch::Sender<AutoSaveState>,
}

impl SaverInner {
    fn set_state(&self, state: AutoSaveState) {
        if let Some(events) = &self.events {
            events.publish(OnboardingEvent::AutoSaveStatusChanged(AutoSaveStatusEvent {
                status: state.status,
                last_saved_at: state.last_saved_at,
                error: state.error.clone(),
            }));
        }
        self.state.send_replace(state);
    }

    async fn save(&self, data: &OnboardingData) -> Result<SaveOutcome, RemoteSaveError> {
        let Some(session_id) = data.session_id.as_deref() else {
            return Ok(SaveOutcome::NoSession);
        };
        let json = serde_json::to_string(data)?;

        let mut last_saved = self.last_saved.lock().await;
        if last_saved.as_deref() == Some(json.as_str()) {
            debug!(session_id, "Auto-save skipped, nothing changed");
            return Ok(SaveOutcome::Unchanged);
        }

        let last_saved_at = self.state.borrow().last_saved_at;
        self.set_state(AutoSaveState {
            status: AutoSaveStatus::Saving,
            last_saved_at,
            error: None,
        });

        match self.remote.save(session_id, data).await {
            Ok(()) => {
                *last_saved = Some(json);
                self.set_state(AutoSaveState {
                    status: AutoSaveStatus::Saved,
                    last_saved_at: Some(Utc::now()),
                    error: None,
                });
                info!(session_id, "Onboarding data saved remotely");
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                warn!(session_id, error = %e, "Remote auto-save failed");
                self.set_state(AutoSaveState {
                    status: AutoSaveStatus::Error,
                    last_saved_at,
                    error: Some(e.to_string()),
                });
                self.notifier.notify(Notification::error(
                    "Auto-save failed",
                    format!("Your changes were not saved: {}", e),
                ));
                Err(e)
            }
        }
    }
}

pub struct AutoSaver {
    inner: Arc<SaverInner>,
    config: AutoSaveConfig,
    debouncer: Debouncer,
}

impl AutoSaver {
    pub fn new(
        remote: Arc<dyn RemoteSaver>,
        config: AutoSaveConfig,
        events: Option<SharedEventBus>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let (state, _) = watch::channel(AutoSaveState::default());
        Self {
            inner: Arc::new(SaverInner {
                remote,
                notifier: notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
                events,
                last_saved: Mutex::new(None),
                state,
            }),
            debouncer: Debouncer::new("auto_save", Duration::from_millis(config.debounce_ms)),
            config,
        }
    }

    /// Watch auto-save state transitions
    pub fn subscribe(&self) -> watch::Receiver<AutoSaveState> {
        self.inner.state.subscribe()
    }

    /// Latest auto-save state
    pub fn state(&self) -> AutoSaveState {
        self.inner.state.borrow().clone()
    }

    /// Queue a debounced save of `data`. Without a session id, or with
    /// auto-save disabled, nothing is queued.
    pub fn schedule(&self, data: Arc<OnboardingData>) -> bool {
        if !self.config.enabled || data.session_id.is_none() {
            return false;
        }
        let inner = self.inner.clone();
        self.debouncer.schedule(async move {
            // failures are reported through status and notifier
            let _ = inner.save(&data).await;
        });
        true
    }

    /// Save right away, replacing any queued save. Used for explicit retries.
    pub async fn save_now(&self, data: &OnboardingData) -> Result<SaveOutcome, RemoteSaveError> {
        self.debouncer.cancel();
        self.inner.save(data).await
    }

    pub fn has_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Drop the scheduled remote save. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        self.debouncer.cancel()
    }

    /// Forget the last saved snapshot and return to idle
    pub async fn reset(&self) {
        self.debouncer.cancel();
        *self.inner.last_saved.lock().await = None;
        self.inner.set_state(AutoSaveState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRemote {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl RemoteSaver for FakeRemote {
        async fn save(&self, _session_id: &str, _data: &OnboardingData) -> Result<(), RemoteSaveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(RemoteSaveError::Unavailable("503".into()));
            }
            Ok(())
        }
    }

    fn with_session(first_name: &str) -> Arc<OnboardingData> {
        let mut data = OnboardingData::default();
        data.session_id = Some("contract-42".into());
        data.contact_info.first_name = first_name.into();
        Arc::new(data)
    }

    fn saver(remote: &Arc<FakeRemote>) -> AutoSaver {
        AutoSaver::new(remote.clone(), AutoSaveConfig::default(), None, None)
    }

    #[tokio::test]
    async fn no_session_no_save() {
        let remote = Arc::new(FakeRemote::default());
        let saver = saver(&remote);
        let data = Arc::new(OnboardingData::default());

        assert!(!saver.schedule(data.clone()));
        assert_eq!(saver.save_now(&data).await.unwrap(), SaveOutcome::NoSession);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_save_runs_once() {
        let remote = Arc::new(FakeRemote::default());
        let saver = saver(&remote);

        for name in ["E", "Ev", "Eva"] {
            saver.schedule(with_session(name));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
        let state = saver.state();
        assert_eq!(state.status, AutoSaveStatus::Saved);
        assert!(state.last_saved_at.is_some());
    }

    #[tokio::test]
    async fn unchanged_snapshot_is_skipped() {
        let remote = Arc::new(FakeRemote::default());
        let saver = saver(&remote);
        let data = with_session("Eva");

        assert_eq!(saver.save_now(&data).await.unwrap(), SaveOutcome::Saved);
        assert_eq!(saver.save_now(&data).await.unwrap(), SaveOutcome::Unchanged);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_sets_error_and_allows_retry() {
        let remote = Arc::new(FakeRemote::default());
        let saver = saver(&remote);
        let mut status = saver.subscribe();
        let data = with_session("Eva");

        remote.failing.store(true, Ordering::SeqCst);
        assert!(saver.save_now(&data).await.is_err());
        assert!(status.has_changed().unwrap());
        let state = status.borrow_and_update().clone();
        assert_eq!(state.status, AutoSaveStatus::Error);
        assert!(state.error.unwrap().contains("503"));
        assert!(state.last_saved_at.is_none());

        remote.failing.store(false, Ordering::SeqCst);
        assert_eq!(saver.save_now(&data).await.unwrap(), SaveOutcome::Saved);
        assert_eq!(saver.state().status, AutoSaveStatus::Saved);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn status_changes_are_published() {
        let remote = Arc::new(FakeRemote::default());
        let events = crate::notifications::create_event_bus();
        let mut subscriber = events.subscribe();
        let saver = AutoSaver::new(remote.clone(), AutoSaveConfig::default(), Some(events), None);

        saver.save_now(&with_session("Eva")).await.unwrap();
        let saving = subscriber.recv().await.unwrap();
        let saved = subscriber.recv().await.unwrap();
        assert!(matches!(
            saving.event,
            OnboardingEvent::AutoSaveStatusChanged(AutoSaveStatusEvent {
                status: AutoSaveStatus::Saving,
                ..
            })
        ));
        assert!(matches!(
            saved.event,
            OnboardingEvent::AutoSaveStatusChanged(AutoSaveStatusEvent {
                status: AutoSaveStatus::Saved,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn disabled_saver_does_not_schedule() {
        let remote = Arc::new(FakeRemote::default());
        let saver = AutoSaver::new(
            remote,
            AutoSaveConfig {
                enabled: false,
                ..Default::default()
            },
            None,
            None,
        );
        assert!(!saver.schedule(with_session("Eva")));
    }
}

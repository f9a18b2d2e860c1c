//! # state
//!
//! Shared application state: the three stores, the notification gateway,
//! the bill parser and the scheduler, all reachable from every handler.
//!
//! * `Arc<AppState>` is cloned into every Axum handler via
//!   `axum::extract::State`.
//! * Each store sits behind its own `tokio::sync::RwLock`: balance reads run
//!   concurrently, appends and reminder transitions are exclusive.
//! * Lock order is settings → reminders; nothing holds the expenses lock
//!   while taking another.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::config::Config;
use crate::engine::ReminderScheduler;
use crate::events::WsEvent;
use crate::extract::{AiExtractor, DisabledExtractor, ExpenseExtractor};
use crate::notify::{BroadcastGateway, NotificationGateway};
use crate::store::{ExpenseStore, KeyValueStore, ReminderStore, SettingsStore};

// ─── AppState ─────────────────────────────────────────────────────────────────

/// Top-level shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    // ── Stores ────────────────────────────────────────────────────────────────
    pub expenses:  Arc<RwLock<ExpenseStore>>,
    pub reminders: Arc<RwLock<ReminderStore>>,
    pub settings:  Arc<RwLock<SettingsStore>>,

    // ── Collaborators ─────────────────────────────────────────────────────────
    pub gateway:   Arc<dyn NotificationGateway>,
    pub extractor: Arc<dyn ExpenseExtractor>,
    pub scheduler: ReminderScheduler,

    // ── Monitor / WebSocket ───────────────────────────────────────────────────
    /// Pre-serialized JSON frames for `/ws/notifications`.
    pub broadcast_tx: broadcast::Sender<String>,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub expenses_added: Arc<AtomicU64>,
    pub started_at:     chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wire everything up over `backend`, using the provided gateway and
    /// extractor.
    pub fn with_collaborators(
        config: Config,
        backend: Arc<dyn KeyValueStore>,
        broadcast_tx: broadcast::Sender<String>,
        gateway: Arc<dyn NotificationGateway>,
        extractor: Arc<dyn ExpenseExtractor>,
    ) -> Self {
        let expenses = Arc::new(RwLock::new(ExpenseStore::load(backend.clone())));
        let reminders = Arc::new(RwLock::new(ReminderStore::load(backend.clone())));
        let settings = Arc::new(RwLock::new(SettingsStore::load(backend)));

        let scheduler = ReminderScheduler::new(
            reminders.clone(),
            settings.clone(),
            gateway.clone(),
            broadcast_tx.clone(),
        );

        Self {
            config:         Arc::new(config),
            expenses,
            reminders,
            settings,
            gateway,
            extractor,
            scheduler,
            broadcast_tx,
            expenses_added: Arc::new(AtomicU64::new(0)),
            started_at:     chrono::Utc::now(),
        }
    }

    /// Production wiring: WebSocket gateway and the configured AI provider.
    pub fn new(config: Config, backend: Arc<dyn KeyValueStore>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        let gateway = Arc::new(BroadcastGateway::new(
            broadcast_tx.clone(),
            config.notification_permission,
        ));

        let extractor: Arc<dyn ExpenseExtractor> =
            match AiExtractor::from_config(reqwest::Client::new(), &config) {
                Some(ai) => Arc::new(ai),
                None => Arc::new(DisabledExtractor),
            };

        Self::with_collaborators(config, backend, broadcast_tx, gateway, extractor)
    }

    /// Broadcast a [`WsEvent`] to every WebSocket client.  Never fails when
    /// nobody is listening.
    pub fn broadcast(&self, event: &WsEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(config: Config, backend: Arc<dyn KeyValueStore>) -> SharedState {
    Arc::new(AppState::new(config, backend))
}

use core::time::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use exam_timetable_client::{FlowVariant, Wizard};
use tracing::debug;

struct Entry {
    wizard: Arc<tokio::sync::Mutex<Wizard>>,
    last_seen: Instant,
}

/// Timetable forms in progress, one per browser session. Forms nobody has
/// touched for `max_idle` are dropped by [`WizardStore::evict_idle`].
#[derive(Clone)]
pub struct WizardStore {
    variant: FlowVariant,
    max_idle: Duration,
    wizards: Arc<Mutex<HashMap<String, Entry>>>,
}

impl WizardStore {
    #[must_use]
    pub fn new(variant: FlowVariant, max_idle: Duration) -> Self {
        Self {
            variant,
            max_idle,
            wizards: Arc::default(),
        }
    }

    #[must_use]
    pub const fn variant(&self) -> FlowVariant {
        self.variant
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.wizards.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The form for `id`, started fresh if there is none yet.
    #[must_use]
    pub fn get(&self, id: &str) -> Arc<tokio::sync::Mutex<Wizard>> {
        let mut wizards = self.lock();
        let entry = wizards.entry(id.to_owned()).or_insert_with(|| Entry {
            wizard: Arc::new(tokio::sync::Mutex::new(Wizard::new(self.variant))),
            last_seen: Instant::now(),
        });
        entry.last_seen = Instant::now();
        Arc::clone(&entry.wizard)
    }

    /// The form for `id` if one is being kept.
    #[must_use]
    pub fn existing(&self, id: &str) -> Option<Arc<tokio::sync::Mutex<Wizard>>> {
        let mut wizards = self.lock();
        let entry = wizards.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.wizard))
    }

    /// Drops forms last seen `max_idle` or longer before `now`. Forms a request
    /// is still holding are kept. Returns how many were dropped.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut wizards = self.lock();
        let before = wizards.len();
        wizards.retain(|_, entry| {
            Arc::strong_count(&entry.wizard) > 1
                || now.saturating_duration_since(entry.last_seen) < self.max_idle
        });
        before - wizards.len()
    }

    /// Runs [`WizardStore::evict_idle`] periodically. Never returns.
    pub async fn sweep(self) {
        let period = (self.max_idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = self.evict_idle(Instant::now());
            if evicted > 0 {
                debug!(evicted, remaining = self.len(), "dropped idle timetable forms");
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

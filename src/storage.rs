//! Health-checked handle to the subscriber store.
//!
//! Handlers never look at a global connectivity flag. They ask the handle for the status of the
//! store: connected, unavailable (the signal for demo mode) or failed, when the database answers
//! but can't be used. Reachability is cached for a short TTL so a burst of requests costs one
//! round trip.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::store::{StoreError, SubscriberStore};

#[derive(Debug, Clone, Copy)]
struct HealthSnapshot {
    checked_at: Instant,
    healthy: bool,
}

#[derive(Debug)]
pub enum StoreStatus {
    Connected(Arc<dyn SubscriberStore>),
    /// Not configured or not reachable.
    Unavailable,
    /// Reachable but unusable, e.g. the schema could not be migrated.
    Failed(StoreError),
}

pub struct Storage {
    store: Option<Arc<dyn SubscriberStore>>,
    ttl: Duration,
    last_check: RwLock<Option<HealthSnapshot>>,
}

impl Storage {
    pub fn new(store: Arc<dyn SubscriberStore>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            ttl,
            last_check: RwLock::new(None),
        }
    }

    /// A handle with no backend at all: every call runs in demo mode.
    pub fn demo() -> Self {
        Self {
            store: None,
            ttl: Duration::ZERO,
            last_check: RwLock::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub async fn store_status(&self) -> StoreStatus {
        let Some(store) = self.store.as_ref() else {
            return StoreStatus::Unavailable;
        };

        match self.check_health(store.as_ref()).await {
            Ok(true) => StoreStatus::Connected(Arc::clone(store)),
            Ok(false) => StoreStatus::Unavailable,
            Err(err) => StoreStatus::Failed(err),
        }
    }

    pub async fn is_connected(&self) -> bool {
        matches!(self.store_status().await, StoreStatus::Connected(_))
    }

    /// Drops the cached health check so the next caller checks the backend again instead of
    /// trusting a stale "healthy" answer.
    pub async fn mark_unavailable(&self) {
        *self.last_check.write().await = None;
    }

    /// `Ok(false)` only when the backend can't be reached. Any other failure is returned as is
    /// and never cached.
    async fn check_health(&self, store: &dyn SubscriberStore) -> Result<bool, StoreError> {
        if let Some(snapshot) = *self.last_check.read().await {
            if snapshot.checked_at.elapsed() < self.ttl {
                return Ok(snapshot.healthy);
            }
        }

        let mut last_check = self.last_check.write().await;

        // Another request may have checked while we waited for the lock.
        if let Some(snapshot) = *last_check {
            if snapshot.checked_at.elapsed() < self.ttl {
                return Ok(snapshot.healthy);
            }
        }

        let healthy = match store.ping().await {
            Ok(()) => true,
            Err(err) if err.is_unavailable() => {
                tracing::warn!(
                    "Subscribers database is not reachable, falling back to demo mode: {:?}",
                    err
                );
                false
            }
            Err(err) => {
                tracing::error!("Subscribers database is reachable but unusable: {:?}", err);
                *last_check = None;
                return Err(err);
            }
        };

        *last_check = Some(HealthSnapshot {
            checked_at: Instant::now(),
            healthy,
        });

        Ok(healthy)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("configured", &self.is_configured())
            .field("ttl", &self.ttl)
            .finish()
    }
}

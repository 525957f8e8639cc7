//! In-memory subscriber store.
//!
//! Keeps subscribers in insertion order behind a `RwLock`. Nothing survives a restart. The
//! test-suite runs the whole API on it, switching it offline to behave like an unreachable
//! database.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::new_subscriber::{NewSubscriber, SUBSCRIBER_SOURCE};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::store::{StoreError, SubscriberStore};

#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriberStore {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    offline: Arc<AtomicBool>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(None));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_online()
    }

    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        self.ensure_online()?;

        let subscribers = self.subscribers.read().await;

        Ok(subscribers.iter().find(|s| &s.email == email).cloned())
    }

    async fn create(&self, new_subscriber: &NewSubscriber) -> Result<Subscriber, StoreError> {
        self.ensure_online()?;

        // Check and insert under the same write guard, like a unique index would.
        let mut subscribers = self.subscribers.write().await;

        if subscribers.iter().any(|s| s.email == new_subscriber.email) {
            return Err(StoreError::UniqueViolation(String::from(
                "coming_soon_subscribers_email_key",
            )));
        }

        let now = Utc::now();
        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            email: new_subscriber.email.clone(),
            interests: new_subscriber.interests.clone(),
            subscribed_at: now,
            updated_at: now,
            source: String::from(SUBSCRIBER_SOURCE),
            ip_address: Some(new_subscriber.provenance.ip_address.clone()),
            user_agent: Some(new_subscriber.provenance.user_agent.clone()),
        };

        subscribers.push(subscriber.clone());

        Ok(subscriber)
    }

    async fn update(&self, subscriber: &Subscriber) -> Result<Subscriber, StoreError> {
        self.ensure_online()?;

        let mut subscribers = self.subscribers.write().await;
        let stored = subscribers
            .iter_mut()
            .find(|s| s.email == subscriber.email)
            .ok_or_else(|| StoreError::NotFound(subscriber.email.to_string()))?;

        stored.interests = subscriber.interests.clone();
        stored.updated_at = subscriber.updated_at;

        Ok(stored.clone())
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        self.ensure_online()?;

        let subscribers = self.subscribers.read().await;

        Ok(subscribers.iter().rev().cloned().collect())
    }
}

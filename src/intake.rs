//! Subscription intake: validation and the create / update / demo decision.

use crate::domain::interest::Interests;
use crate::domain::new_subscriber::{NewSubscriber, Provenance};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::storage::{Storage, StoreStatus};
use crate::store::{error_chain_fmt, StoreError, SubscriberStore};

pub struct SubscriptionRequest {
    pub email: Option<String>,
    pub interests: Interests,
    pub provenance: Provenance,
}

#[derive(Debug)]
pub enum SubscribeOutcome {
    Created(Subscriber),
    /// The email was already subscribed; its interests were replaced when new ones were given.
    Updated,
    /// Storage is unreachable: the caller is told it worked but nothing was written.
    DemoAccepted,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    InvalidEmail(String),
    #[error("Failed to store the subscription.")]
    Unexpected(#[source] StoreError),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[tracing::instrument(
    name = "Processing a subscription request",
    skip(storage, request),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    storage: &Storage,
    request: SubscriptionRequest,
) -> Result<SubscribeOutcome, SubscribeError> {
    let email = SubscriberEmail::parse(request.email.unwrap_or_default())
        .map_err(SubscribeError::InvalidEmail)?;

    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));

    let store = match storage.store_status().await {
        StoreStatus::Connected(store) => store,
        StoreStatus::Unavailable => {
            tracing::warn!("Database not connected, accepting the subscription in demo mode");
            return Ok(SubscribeOutcome::DemoAccepted);
        }
        StoreStatus::Failed(err) => return Err(SubscribeError::Unexpected(err)),
    };

    let new_subscriber = NewSubscriber {
        email,
        interests: request.interests,
        provenance: request.provenance,
    };

    match store_subscription(store.as_ref(), new_subscriber).await {
        Ok(outcome) => Ok(outcome),
        Err(err) if err.is_unavailable() => {
            tracing::warn!(
                "Database became unreachable, accepting the subscription in demo mode: {:?}",
                err
            );
            storage.mark_unavailable().await;
            Ok(SubscribeOutcome::DemoAccepted)
        }
        Err(err) => {
            tracing::error!("Failed to store the subscription: {:?}", err);
            Err(SubscribeError::Unexpected(err))
        }
    }
}

async fn store_subscription(
    store: &dyn SubscriberStore,
    new_subscriber: NewSubscriber,
) -> Result<SubscribeOutcome, StoreError> {
    if let Some(existing) = store.find_by_email(&new_subscriber.email).await? {
        tracing::info!("Updating existing subscriber");
        update_interests(store, existing, new_subscriber.interests).await?;
        return Ok(SubscribeOutcome::Updated);
    }

    match store.create(&new_subscriber).await {
        Ok(subscriber) => {
            tracing::info!(
                interests = ?new_subscriber.interests.to_strings(),
                "New subscriber saved"
            );
            Ok(SubscribeOutcome::Created(subscriber))
        }
        // A concurrent request created the same email first. Treat it as a resubmission.
        Err(StoreError::UniqueViolation(constraint)) => {
            tracing::info!(
                constraint = %constraint,
                "Lost a concurrent insert for the same email"
            );
            let existing = store
                .find_by_email(&new_subscriber.email)
                .await?
                .ok_or_else(|| StoreError::NotFound(new_subscriber.email.to_string()))?;
            update_interests(store, existing, new_subscriber.interests).await?;
            Ok(SubscribeOutcome::Updated)
        }
        Err(err) => Err(err),
    }
}

/// Resubmissions without interests leave the record untouched.
async fn update_interests(
    store: &dyn SubscriberStore,
    existing: Subscriber,
    interests: Interests,
) -> Result<(), StoreError> {
    if interests.is_empty() {
        return Ok(());
    }

    store.update(&existing.with_interests(interests)).await?;

    Ok(())
}

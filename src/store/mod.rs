//! Persistence seam for subscribers.
//!
//! The email uniqueness invariant is enforced by every implementation itself, not by callers:
//! two concurrent `create` calls for the same email must leave exactly one record and report
//! [`StoreError::UniqueViolation`] to the loser.

pub mod memory;
pub mod postgres;

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;

pub use memory::InMemorySubscriberStore;
pub use postgres::PgSubscriberStore;

const UNIQUE_VIOLATION_CODE: &str = "23505";

#[async_trait::async_trait]
pub trait SubscriberStore: std::fmt::Debug + Send + Sync {
    /// Cheap round trip used to decide whether the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &SubscriberEmail)
        -> Result<Option<Subscriber>, StoreError>;

    async fn create(&self, new_subscriber: &NewSubscriber) -> Result<Subscriber, StoreError>;

    /// Persists the interests of an existing subscriber, located by email.
    async fn update(&self, subscriber: &Subscriber) -> Result<Subscriber, StoreError>;

    /// Every subscriber, newest subscription first.
    async fn list_all(&self) -> Result<Vec<Subscriber>, StoreError>;
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("The subscribers database is unreachable.")]
    Unavailable(#[source] Option<sqlx::Error>),
    #[error("Unique constraint {0} was violated.")]
    UniqueViolation(String),
    #[error("Subscriber {0} was not found.")]
    NotFound(String),
    #[error("Stored subscriber data is corrupted: {0}")]
    Corrupted(String),
    #[error("Failed to migrate the subscribers database.")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("Failed to execute a query against the subscribers database.")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_connectivity_error(&err) {
            return StoreError::Unavailable(Some(err));
        }

        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION_CODE) {
                let constraint = db_err.constraint().unwrap_or("email").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }

        StoreError::Database(err)
    }
}

fn is_connectivity_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed
    )
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

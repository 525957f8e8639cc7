use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::domain::interest::Interests;
use crate::domain::new_subscriber::{NewSubscriber, SUBSCRIBER_SOURCE};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::store::{StoreError, SubscriberStore};

/// Subscribers kept in the `coming_soon_subscribers` table. The `UNIQUE` constraint on `email`
/// closes the race between concurrent first-time subscriptions.
///
/// Migrations run on the first successful health check, so a database that comes up after the
/// service still ends up with the table.
pub struct PgSubscriberStore {
    db_pool: PgPool,
    migrated: OnceCell<()>,
}

impl std::fmt::Debug for PgSubscriberStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSubscriberStore")
            .field("db_pool", &"[PgPool]")
            .finish()
    }
}

impl PgSubscriberStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self {
            db_pool,
            migrated: OnceCell::new(),
        }
    }
}

fn subscriber_from_row(row: &PgRow) -> Result<Subscriber, StoreError> {
    let email = SubscriberEmail::parse(row.try_get("email")?).map_err(StoreError::Corrupted)?;
    let interests =
        Interests::parse(row.try_get("interests")?).map_err(StoreError::Corrupted)?;

    Ok(Subscriber {
        id: row.try_get("id")?,
        email,
        interests,
        subscribed_at: row.try_get("subscribed_at")?,
        updated_at: row.try_get("updated_at")?,
        source: row.try_get("source")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
    })
}

#[async_trait::async_trait]
impl SubscriberStore for PgSubscriberStore {
    #[tracing::instrument(name = "Checking the subscribers database connection", skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .map_err(StoreError::from)?;

        self.migrated
            .get_or_try_init(|| async {
                sqlx::migrate!("./migrations").run(&self.db_pool).await?;
                tracing::info!("Database migrations applied");
                Ok::<(), sqlx::migrate::MigrateError>(())
            })
            .await
            .map_err(|err| {
                tracing::error!("Failed to run the database migrations: {:?}", err);
                StoreError::Migration(err)
            })?;

        Ok(())
    }

    #[tracing::instrument(name = "Fetching a subscriber by email", skip(self))]
    async fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, interests, subscribed_at, updated_at, source, ip_address, user_agent
            FROM coming_soon_subscribers
            WHERE email = $1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(&self.db_pool)
        .await?;

        row.as_ref().map(subscriber_from_row).transpose()
    }

    #[tracing::instrument(
        name = "Insert a new subscriber into the database",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    async fn create(&self, new_subscriber: &NewSubscriber) -> Result<Subscriber, StoreError> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO coming_soon_subscribers
                (id, email, interests, subscribed_at, updated_at, source, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7)
            RETURNING id, email, interests, subscribed_at, updated_at, source, ip_address, user_agent
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_subscriber.email.as_ref())
        .bind(new_subscriber.interests.to_strings())
        .bind(now)
        .bind(SUBSCRIBER_SOURCE)
        .bind(&new_subscriber.provenance.ip_address)
        .bind(&new_subscriber.provenance.user_agent)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            StoreError::from(err)
        })?;

        subscriber_from_row(&row)
    }

    #[tracing::instrument(
        name = "Updating the interests of a subscriber",
        skip(self, subscriber),
        fields(subscriber_email = %subscriber.email)
    )]
    async fn update(&self, subscriber: &Subscriber) -> Result<Subscriber, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE coming_soon_subscribers
            SET interests = $2, updated_at = $3
            WHERE email = $1
            RETURNING id, email, interests, subscribed_at, updated_at, source, ip_address, user_agent
            "#,
        )
        .bind(subscriber.email.as_ref())
        .bind(subscriber.interests.to_strings())
        .bind(subscriber.updated_at)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(subscriber.email.to_string()))?;

        subscriber_from_row(&row)
    }

    #[tracing::instrument(name = "Listing all subscribers", skip(self))]
    async fn list_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, interests, subscribed_at, updated_at, source, ip_address, user_agent
            FROM coming_soon_subscribers
            ORDER BY subscribed_at DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        rows.iter().map(subscriber_from_row).collect()
    }
}

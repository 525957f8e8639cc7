//! Exercises `PgSubscriberStore` against a real database. Needs the Postgres instance from
//! `config/development.yaml` (or `APP_DATABASE__URL`), so run with `cargo test -- --ignored`.

use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use coming_soon::config::get_configuration;
use coming_soon::domain::interest::{Interest, Interests};
use coming_soon::domain::new_subscriber::{NewSubscriber, Provenance};
use coming_soon::domain::subscriber_email::SubscriberEmail;
use coming_soon::startup::get_connection_db_pool;
use coming_soon::store::{PgSubscriberStore, StoreError, SubscriberStore};

async fn configure_db() -> PgPool {
    let config = get_configuration().expect("Missing configuration file.");
    let db_options = config
        .database
        .get_db_options()
        .expect("No database configured.")
        .expect("Invalid database connection string.");
    let db_test_name = format!("db_{}", Uuid::new_v4().to_string().replace('-', "_"));

    // Create database
    let mut connection = PgConnection::connect_with(&db_options)
        .await
        .expect("Failed to connect to Postgres.");

    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, db_test_name))
        .await
        .expect("Failed to create database.");

    connection
        .close()
        .await
        .expect("Failed to close connection.");

    get_connection_db_pool(&config.database, db_options.database(&db_test_name))
}

async fn migrated_store() -> PgSubscriberStore {
    let store = PgSubscriberStore::new(configure_db().await);

    // The first health check applies the migrations.
    store.ping().await.expect("Failed to reach the test database.");

    store
}

fn new_subscriber(email: &str, interests: &[Interest]) -> NewSubscriber {
    NewSubscriber {
        email: SubscriberEmail::parse(email.to_string()).unwrap(),
        interests: Interests::new(interests.iter().copied()),
        provenance: Provenance::default(),
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn created_subscribers_are_found_by_email() {
    let store = migrated_store().await;

    let created = store
        .create(&new_subscriber("frank@test.com", &[Interest::Vendor]))
        .await
        .unwrap();
    let found = store.find_by_email(&created.email).await.unwrap().unwrap();

    assert_eq!(found.id, created.id);
    assert_eq!(found.interests.to_strings(), vec!["vendor"]);
    assert_eq!(found.source, "coming-soon-page");
    assert_eq!(found.ip_address.as_deref(), Some("unknown"));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn duplicated_emails_violate_the_unique_constraint() {
    let store = migrated_store().await;
    let subscriber = new_subscriber("frank@test.com", &[]);

    store.create(&subscriber).await.unwrap();
    let second = store.create(&subscriber).await;

    assert!(matches!(second, Err(StoreError::UniqueViolation(_))));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn concurrent_creates_persist_a_single_row() {
    let store = Arc::new(migrated_store().await);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .create(&new_subscriber("race@test.com", &[Interest::Venue]))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(StoreError::UniqueViolation(_)) => {}
            Err(err) => panic!("Unexpected error: {:?}", err),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn update_replaces_interests_only() {
    let store = migrated_store().await;
    let created = store
        .create(&new_subscriber("frank@test.com", &[Interest::Vendor]))
        .await
        .unwrap();

    let updated = store
        .update(&created.clone().with_interests(Interests::new([Interest::Venue])))
        .await
        .unwrap();

    assert_eq!(updated.interests.to_strings(), vec!["venue"]);
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.subscribed_at, created.subscribed_at);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn subscribers_are_listed_newest_first() {
    let store = migrated_store().await;

    for email in ["first@test.com", "second@test.com"] {
        store.create(&new_subscriber(email, &[])).await.unwrap();
    }

    let emails: Vec<String> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.email.to_string())
        .collect();

    assert_eq!(emails, vec!["second@test.com", "first@test.com"]);
}

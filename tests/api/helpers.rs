use reqwest::Response;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use coming_soon::{
    config::{get_configuration, Settings},
    domain::{
        new_subscriber::NewSubscriber, subscriber::Subscriber, subscriber_email::SubscriberEmail,
    },
    startup::Application,
    storage::Storage,
    store::{InMemorySubscriberStore, StoreError, SubscriberStore},
    telemetry::{get_subscriber, init_subscriber},
};

// Logs are swallowed unless TEST_LOG is set, e.g. `TEST_LOG=true cargo test | bunyan`
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = String::from("info");
    let subscriber_name = String::from("test");

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to init the tracing subscriber.");
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).expect("Failed to init the tracing subscriber.");
    };
});

pub struct TestApp {
    pub address: String,
    pub store: InMemorySubscriberStore,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawns the app on a random port backed by an in-memory store that is checked on every call.
    pub async fn spawn_app() -> TestApp {
        let store = InMemorySubscriberStore::new();
        let storage = Storage::new(Arc::new(store.clone()), Duration::ZERO);

        Self::spawn_with_storage(storage, store).await
    }

    /// Spawns the app without any database configured.
    pub async fn spawn_demo_app() -> TestApp {
        Self::spawn_with_storage(Storage::demo(), InMemorySubscriberStore::new()).await
    }

    /// Spawns the app on top of an arbitrary store, checked on every call. `store` on the returned
    /// app is an unrelated empty in-memory store.
    pub async fn spawn_app_with_store(store: impl SubscriberStore + 'static) -> TestApp {
        let storage = Storage::new(Arc::new(store), Duration::ZERO);

        Self::spawn_with_storage(storage, InMemorySubscriberStore::new()).await
    }

    /// Spawns the app the way `main` does, pointing it at the given connection string.
    pub async fn spawn_app_with_db_url(db_url: &str) -> TestApp {
        LazyLock::force(&TRACING);

        let mut config = test_configuration();
        config.set_db_url(Some(db_url.to_string()));
        config.database.acquire_timeout_millis = 500;

        let application = Application::build(config)
            .await
            .expect("Failed to build application.");

        Self::spawn(application, InMemorySubscriberStore::new())
    }

    async fn spawn_with_storage(storage: Storage, store: InMemorySubscriberStore) -> TestApp {
        LazyLock::force(&TRACING);

        let application = Application::build_with_storage(test_configuration(), storage)
            .expect("Failed to build application.");

        Self::spawn(application, store)
    }

    fn spawn(application: Application, store: InMemorySubscriberStore) -> TestApp {
        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            store,
            api_client: reqwest::Client::new(),
        }
    }

    pub async fn post_subscription(&self, body: serde_json::Value) -> Response {
        self.api_client
            .post(&format!("{}/api/coming-soon/subscribe", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_subscribers(&self) -> Response {
        self.api_client
            .get(&format!("{}/api/coming-soon/subscribers", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.api_client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_self_test(&self) -> Response {
        self.api_client
            .post(&format!("{}/api/coming-soon/test", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Fails its health check and its queries with the given errors.
#[derive(Debug)]
pub struct FailingStore {
    pub ping: fn() -> Result<(), StoreError>,
    pub query: fn() -> StoreError,
}

impl FailingStore {
    /// Reachable, but every query fails with `query`.
    pub fn on_queries(query: fn() -> StoreError) -> Self {
        Self {
            ping: || Ok(()),
            query,
        }
    }

    /// Reachable, but unusable: the health check itself fails with an unexpected error, like a
    /// failed migration.
    pub fn unusable() -> Self {
        Self {
            ping: || Err(StoreError::Database(sqlx::Error::RowNotFound)),
            query: || StoreError::Database(sqlx::Error::RowNotFound),
        }
    }
}

#[async_trait::async_trait]
impl SubscriberStore for FailingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        (self.ping)()
    }

    async fn find_by_email(
        &self,
        _email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        Err((self.query)())
    }

    async fn create(&self, _new: &NewSubscriber) -> Result<Subscriber, StoreError> {
        Err((self.query)())
    }

    async fn update(&self, _subscriber: &Subscriber) -> Result<Subscriber, StoreError> {
        Err((self.query)())
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        Err((self.query)())
    }
}

fn test_configuration() -> Settings {
    let mut config = get_configuration().expect("Missing configuration file.");

    // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
    // take into account: when port is 0, the OS will search for the first available port
    config.set_app_port(0);
    config.application.host = String::from("127.0.0.1");
    config.set_db_url(None);

    config
}

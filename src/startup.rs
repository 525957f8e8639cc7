use actix_web::dev::Server;
use actix_web::{error, web, App, HttpResponse, HttpServer};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::routes::{
    handle_create_subscription, health_check, list_subscribers, run_self_test, FailureResponse,
    INVALID_EMAIL_MESSAGE,
};
use crate::self_test_client::SelfTestClient;
use crate::storage::Storage;
use crate::store::PgSubscriberStore;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let storage = build_storage(&config.database);

        Self::build_with_storage(config, storage)
    }

    /// Builds the server around an already prepared storage handle.
    pub fn build_with_storage(config: Settings, storage: Storage) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        // The self-test goes through loopback, whatever interface the server is bound to.
        let self_test_client = SelfTestClient::new(
            format!("http://127.0.0.1:{}", port),
            Some(config.application.get_self_test_timeout()),
        )
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
        let server = run(listener, storage, self_test_client)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    storage: Storage,
    self_test_client: SelfTestClient,
) -> Result<Server, std::io::Error> {
    let storage = web::Data::new(storage);
    let self_test_client = web::Data::new(self_test_client);

    let server = HttpServer::new(move || {
        // Malformed bodies and unknown interest tags are answered like a missing email
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            tracing::warn!("Rejected subscription body: {}", err);
            error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(FailureResponse::new(INVALID_EMAIL_MESSAGE)),
            )
            .into()
        });

        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .route("/api/health", web::get().to(health_check))
            .route(
                "/api/coming-soon/subscribe",
                web::post().to(handle_create_subscription),
            )
            .route(
                "/api/coming-soon/subscribers",
                web::get().to(list_subscribers),
            )
            .route("/api/coming-soon/test", web::post().to(run_self_test))
            .app_data(json_config)
            .app_data(storage.clone())
            .app_data(self_test_client.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Never fails: a missing or malformed connection string leaves the service in demo mode, and an
/// unreachable database is only noticed by the storage health check.
pub fn build_storage(config: &DatabaseSettings) -> Storage {
    let db_options = match config.get_db_options() {
        Some(Ok(db_options)) => db_options,
        Some(Err(err)) => {
            tracing::error!(
                "Database connection string is not valid, running in demo mode: {:?}",
                err
            );
            return Storage::demo();
        }
        None => {
            tracing::warn!("No database configured, running in demo mode");
            return Storage::demo();
        }
    };

    let db_pool = get_connection_db_pool(config, db_options);

    Storage::new(
        Arc::new(PgSubscriberStore::new(db_pool)),
        config.get_health_check_ttl(),
    )
}

pub fn get_connection_db_pool(
    config: &DatabaseSettings,
    db_options: PgConnectOptions,
) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(config.get_acquire_timeout())
        .connect_lazy_with(db_options)
}

use std::str::FromStr;
use std::time::Duration;

use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub self_test_timeout_millis: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    // A single connection string selects the backend. Without one the service runs in demo mode.
    // secrecy keeps the credentials inside it out of logs.
    #[serde(default)]
    pub url: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub acquire_timeout_millis: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub health_check_ttl_millis: u64,
    #[serde(default)]
    pub require_ssl: bool,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }

    pub fn set_db_url(&mut self, url: Option<String>) {
        self.database.url = url.map(Secret::new);
    }
}

impl DatabaseSettings {
    pub fn is_configured(&self) -> bool {
        self.url
            .as_ref()
            .map(|url| !url.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }

    /// Connection options for the configured database, `None` when no connection string is set.
    pub fn get_db_options(&self) -> Option<Result<PgConnectOptions, sqlx::Error>> {
        if !self.is_configured() {
            return None;
        }

        let url = self.url.as_ref()?;
        let options = PgConnectOptions::from_str(url.expose_secret()).map(|options| {
            let mut options = if self.require_ssl {
                options.ssl_mode(PgSslMode::Require)
            } else {
                options
            };

            options.log_statements(log::LevelFilter::Trace);

            options
        });

        Some(options)
    }

    pub fn get_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_millis)
    }

    pub fn get_health_check_ttl(&self) -> Duration {
        Duration::from_millis(self.health_check_ttl_millis)
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }

    pub fn get_self_test_timeout(&self) -> Duration {
        Duration::from_millis(self.self_test_timeout_millis)
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir().map_err(|err| {
        ConfigError::Message(format!(
            "Failed to determine the current directory: {}",
            err
        ))
    })?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let enviroment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(enviroment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_DATABASE__URL would set Settings.database.url
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    tracing::info!("Application environment = {:?}", enviroment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::{domain::source::SourceConfig, services::sink::Destination};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: Option<DatabaseSettings>,
    pub webdriver: WebDriverSettings,
    pub fetch: FetchSettings,
    pub output: OutputSettings,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default)]
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = match self.require_ssl {
            true => PgSslMode::Require,
            false => PgSslMode::Prefer,
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct WebDriverSettings {
    // e.g. http://localhost:4444 for a local chromedriver/selenium
    pub url: String,
    #[serde(default = "default_true")]
    pub headless: bool,
    pub proxy: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct FetchSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_load_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_attempts: u8,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub backoff_millis: u64,
    pub user_agent: Option<String>,
}

impl FetchSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_millis)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            page_load_timeout_secs: 30,
            max_attempts: 3,
            backoff_millis: 2_000,
            user_agent: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct OutputSettings {
    pub directory: PathBuf,
    #[serde(default = "default_file_stem")]
    pub file_stem: String,
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl OutputSettings {
    pub fn csv_path(&self) -> PathBuf {
        self.directory.join(format!("{}.csv", self.file_stem))
    }

    pub fn json_path(&self) -> PathBuf {
        self.directory.join(format!("{}.json", self.file_stem))
    }

    pub fn report_path(&self) -> PathBuf {
        self.directory.join(format!("{}_report.md", self.file_stem))
    }
}

fn default_true() -> bool {
    true
}

fn default_file_stem() -> String {
    "tenders".to_string()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub jobs: JobsConfig,
    pub rsvp: RsvpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address as a string in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Regeneration job settings.
#[derive(Clone, Deserialize)]
pub struct JobsConfig {
    /// Shared secret the external trigger must present.
    pub secret: String,
    /// When set, the server also runs the job itself on this interval.
    pub interval_secs: Option<u64>,
    /// Upper bound on groups regenerated at the same time.
    pub concurrency: usize,
}

// Keeps the secret out of the startup log line.
impl std::fmt::Debug for JobsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobsConfig")
            .field("secret", &"<redacted>")
            .field("interval_secs", &self.interval_secs)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RsvpConfig {
    /// Attempts made when a concurrent roster write wins the race.
    pub max_retries: u8,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    ///
    /// Environment variables use the `CADENCE_` prefix and `__` between
    /// nesting levels, e.g. `CADENCE_DATABASE__URL`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8700)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "info")?
            .set_default("jobs.concurrency", 8)?
            .set_default("rsvp.max_retries", 5)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env overrides file
            .add_source(
                config::Environment::with_prefix("CADENCE")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}

use std::env;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_JWT_SECRET: &str = "your-secret-key";

/// Short environment names accepted next to `AGRO__SECTION__KEY`.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.name"),
    ("DATABASE_URL", "database.url"),
    ("PORT", "server.port"),
    ("JWT_SECRET", "auth.jwt_secret"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub url: Option<String>,
    pub pool_size: u32,
    pub timeout_seconds: u64,
    pub reset_on_start: bool,
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AuthSettings {
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Settings {
    /// Defaults, then `appsettings.*` if present, then `AGRO__*` variables,
    /// then the short aliases.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(
                Environment::with_prefix("AGRO")
                    .separator("__")
                    .try_parsing(true),
            );
        let aliases = ENV_ALIASES
            .iter()
            .map(|(var, key)| (*key, env::var(var).ok()));
        Self::layered(builder, aliases)
    }

    pub(crate) fn layered<I>(
        builder: ConfigBuilder<DefaultState>,
        overrides: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'static str, Option<String>)>,
    {
        let mut builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000_i64)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432_i64)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "password")?
            .set_default("database.name", "agromanage")?
            .set_default("database.pool_size", 10_i64)?
            .set_default("database.timeout_seconds", 30_i64)?
            .set_default("database.reset_on_start", false)?
            .set_default("auth.jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("auth.token_ttl_hours", 24_i64)?;
        for (key, value) in overrides {
            builder = builder.set_override_option(key, value)?;
        }
        builder.build()?.try_deserialize()
    }
}

//! Query configuration.
//!
//! [`QueryConfig`] is read from `config/config.toml` (section `[query]`) with
//! `LIFEGUARD__QUERY__*` environment overrides, e.g.
//! `LIFEGUARD__QUERY__DIALECT=sqlite`.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;

static GLOBAL: Lazy<QueryConfig> = Lazy::new(|| {
    QueryConfig::load().unwrap_or_else(|err| {
        log::warn!("Falling back to default query configuration: {}", err);
        QueryConfig::default()
    })
});

/// SQL dialect used when a query builds its own command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// Upper bound on parent keys sent in one eager loading `IN` list.
    #[serde(default = "default_eager_batch_size")]
    pub eager_batch_size: usize,
    /// Log every built statement at debug level.
    #[serde(default)]
    pub log_statements: bool,
}

fn default_eager_batch_size() -> usize {
    500
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            eager_batch_size: default_eager_batch_size(),
            log_statements: false,
        }
    }
}

impl QueryConfig {
    /// Load the query configuration from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/config.toml").required(false))
            .add_source(Environment::with_prefix("LIFEGUARD").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new("config/config.toml").exists() {
                    log::warn!(
                        "Failed to load config file, falling back to env. Error: {}",
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix("LIFEGUARD").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        // A missing section is not an error; every field has a default
        match settings.get::<QueryConfig>("query") {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(QueryConfig::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Query configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }

    /// Process-wide configuration, loaded once on first use.
    pub fn global() -> &'static QueryConfig {
        &GLOBAL
    }

    /// Clamp the batch size so a zero in the config cannot stall eager loading.
    pub(crate) fn batch_size(&self) -> usize {
        self.eager_batch_size.max(1)
    }
}

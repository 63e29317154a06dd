use core_config::{env_parse_or_default, server::ServerConfig, FromEnv};
use domain_users::BulkConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub environment: Environment,
    pub bulk: BulkConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080

        let defaults = BulkConfig::default();
        let bulk = BulkConfig {
            pool_size: env_parse_or_default("BULK_POOL_SIZE", defaults.pool_size)?,
            generation_batch_size: env_parse_or_default(
                "BULK_GENERATION_BATCH_SIZE",
                defaults.generation_batch_size,
            )?,
            import_batch_size: env_parse_or_default(
                "BULK_IMPORT_BATCH_SIZE",
                defaults.import_batch_size,
            )?,
            max_generation_count: env_parse_or_default(
                "BULK_MAX_GENERATION_COUNT",
                defaults.max_generation_count,
            )?,
        };

        Ok(Self {
            server,
            environment,
            bulk,
        })
    }
}

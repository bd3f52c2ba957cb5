use config::{Config, Environment};
use log::info;
use serde::Deserialize;

/// Runtime configuration, layered from `MOCKVIEW_`-prefixed environment
/// variables over the defaults below. Database settings fall back to the
/// same local-dev values the hosted deployment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for per-user resume uploads.
    pub resume_dir: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let cfg = Config::builder()
            .set_default("oracle.base_url", "https://api.openai.com/v1")?
            .set_default("oracle.api_key", "")?
            .set_default("oracle.model", "gpt-4")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.name", "mockview_db")?
            .set_default("database.user", "mockview_user")?
            .set_default("database.password", "")?
            .set_default("storage.resume_dir", "./resumes")?
            .add_source(Environment::with_prefix("MOCKVIEW").separator("__"))
            .build()?;

        let parsed: AppConfig = cfg.try_deserialize()?;
        info!(
            "Configuration loaded: oracle={} model={} db={}@{}:{}/{}",
            parsed.oracle.base_url,
            parsed.oracle.model,
            parsed.database.user,
            parsed.database.host,
            parsed.database.port,
            parsed.database.name
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_environment() {
        let cfg = AppConfig::load().expect("defaults should always deserialize");
        assert_eq!(cfg.database.port, 5432);
        assert_eq!(cfg.oracle.model, "gpt-4");
        assert!(cfg.database.url().starts_with("postgres://"));
    }
}

//! Configuration module
//!
//! Environment-driven configuration for the API service and the extraction
//! pipeline. `Config::from_env()` reads everything once at startup; absence
//! of the OpenAI key is deliberately not a startup failure (extraction then
//! fails per-document instead).

use std::env;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
const DEFAULT_EXTRACTION_MAX_WORKERS: usize = 4;
const DEFAULT_EXTRACTION_QUEUE_DEPTH: usize = 64;
const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECEPTION_EXTENSIONS: &str = "pdf,jpg,jpeg,png";

/// Base configuration shared by server and database setup
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // OpenAI configuration. A missing key is a per-extraction failure,
    // never a startup failure.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    // Reception upload limits
    pub max_file_size_bytes: usize,
    pub reception_allowed_extensions: Vec<String>,
    // Extraction queue configuration
    pub extraction_max_workers: usize,
    pub extraction_queue_depth: usize,
    pub extraction_timeout_seconds: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.inner().openai_api_key.as_deref()
    }

    pub fn openai_model(&self) -> &str {
        &self.inner().openai_model
    }

    pub fn openai_base_url(&self) -> &str {
        &self.inner().openai_base_url
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.inner().max_file_size_bytes
    }

    pub fn reception_allowed_extensions(&self) -> &[String] {
        &self.inner().reception_allowed_extensions
    }

    pub fn extraction_max_workers(&self) -> usize {
        self.inner().extraction_max_workers
    }

    pub fn extraction_queue_depth(&self) -> usize {
        self.inner().extraction_queue_depth
    }

    pub fn extraction_timeout_seconds(&self) -> u64 {
        self.inner().extraction_timeout_seconds
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB);

        let reception_allowed_extensions = env::var("RECEPTION_ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| DEFAULT_RECEPTION_EXTENSIONS.to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        // An empty OPENAI_API_KEY is treated the same as an unset one.
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(ServiceConfig {
            base: BaseConfig {
                server_port: env::var("PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                cors_origins,
                db_max_connections: env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(MAX_CONNECTIONS),
                db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(CONNECTION_TIMEOUT_SECS),
                environment,
            },
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            openai_api_key,
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            reception_allowed_extensions,
            extraction_max_workers: env::var("EXTRACTION_MAX_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EXTRACTION_MAX_WORKERS),
            extraction_queue_depth: env::var("EXTRACTION_QUEUE_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EXTRACTION_QUEUE_DEPTH),
            extraction_timeout_seconds: env::var("EXTRACTION_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EXTRACTION_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }
        if self.extraction_max_workers == 0 {
            anyhow::bail!("EXTRACTION_MAX_WORKERS must be at least 1");
        }
        if self.extraction_queue_depth == 0 {
            anyhow::bail!("EXTRACTION_QUEUE_DEPTH must be at least 1");
        }
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_MB must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            base: BaseConfig {
                server_port: DEFAULT_SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                environment: "development".to_string(),
            },
            database_url: "postgres://localhost/kontera".to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            reception_allowed_extensions: vec!["pdf".to_string()],
            extraction_max_workers: DEFAULT_EXTRACTION_MAX_WORKERS,
            extraction_queue_depth: DEFAULT_EXTRACTION_QUEUE_DEPTH,
            extraction_timeout_seconds: DEFAULT_EXTRACTION_TIMEOUT_SECS,
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = test_config();
        config.extraction_max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_queue_depth() {
        let mut config = test_config();
        config.extraction_queue_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn is_production_matches_prod_aliases() {
        let mut config = test_config();
        config.base.environment = "Production".to_string();
        assert!(Config(Box::new(config.clone())).is_production());
        config.base.environment = "prod".to_string();
        assert!(Config(Box::new(config.clone())).is_production());
        config.base.environment = "development".to_string();
        assert!(!Config(Box::new(config)).is_production());
    }
}

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenMode {
    /// `jwt-token-<id>-<millis>` text tokens, readable by existing clients
    Plain,
    /// HS256-signed tokens; requires `token_secret`
    Signed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub token_mode: TokenMode,
    #[serde(skip_serializing)]
    pub token_secret: Option<String>,
    pub demo_login_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub supabase_url: Option<String>,
    pub supabase_bucket: String,
    #[serde(skip_serializing)]
    pub supabase_api_key: Option<String>,
}

fn parse_backend(value: &str) -> Option<StoreBackend> {
    match value.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" | "pg" => Some(StoreBackend::Postgres),
        "memory" | "mem" => Some(StoreBackend::Memory),
        _ => None,
    }
}

fn parse_token_mode(value: &str) -> Option<TokenMode> {
    match value.to_ascii_lowercase().as_str() {
        "plain" => Some(TokenMode::Plain),
        "signed" | "jwt" => Some(TokenMode::Signed),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("TRAVEL_API_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("TRAVEL_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            self.database.backend = parse_backend(&v).unwrap_or(self.database.backend);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_MODE") {
            self.security.token_mode = parse_token_mode(&v).unwrap_or(self.security.token_mode);
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_SECRET") {
            self.security.token_secret = non_empty(v);
        }
        if let Ok(v) = env::var("SECURITY_DEMO_LOGIN_ENABLED") {
            self.security.demo_login_enabled = v.parse().unwrap_or(self.security.demo_login_enabled);
        }

        // Object storage overrides
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.storage.supabase_url = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_BUCKET") {
            self.storage.supabase_bucket = non_empty(v).unwrap_or(self.storage.supabase_bucket);
        }
        if let Ok(v) = env::var("SUPABASE_API_KEY") {
            self.storage.supabase_api_key = non_empty(v);
        }

        self
    }

    pub(crate) fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                default_page_size: 10,
                max_page_size: 100,
                max_request_size_bytes: 20 * 1024 * 1024, // 20MB, photo uploads
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:5173".to_string(), "http://localhost:3000".to_string()],
                token_mode: TokenMode::Plain,
                token_secret: None,
                demo_login_enabled: true,
            },
            storage: StorageConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                default_page_size: 10,
                max_page_size: 50,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                token_mode: TokenMode::Plain,
                token_secret: None,
                demo_login_enabled: true,
            },
            storage: StorageConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                default_page_size: 10,
                max_page_size: 50,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                token_mode: TokenMode::Signed,
                token_secret: None,
                demo_login_enabled: false,
            },
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_bucket: "trips-photo".to_string(),
            supabase_api_key: None,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.api.default_page_size, 10);
        assert_eq!(config.security.token_mode, TokenMode::Plain);
        assert!(config.security.demo_login_enabled);
        assert_eq!(config.storage.supabase_bucket, "trips-photo");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.security.token_mode, TokenMode::Signed);
        assert!(!config.security.demo_login_enabled);
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn parses_backend_and_token_mode_names() {
        assert_eq!(parse_backend("MEMORY"), Some(StoreBackend::Memory));
        assert_eq!(parse_backend("postgresql"), Some(StoreBackend::Postgres));
        assert_eq!(parse_backend("sqlite"), None);
        assert_eq!(parse_token_mode("jwt"), Some(TokenMode::Signed));
        assert_eq!(parse_token_mode("Plain"), Some(TokenMode::Plain));
        assert_eq!(parse_token_mode("hmac"), None);
    }

    #[test]
    fn blank_values_are_unset() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(" x ".to_string()), Some("x".to_string()));
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub erp: ErpConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            name: default_db_name(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "reparto".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for login and reset tokens.
    #[serde(default)]
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_mail_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            endpoint: default_mail_endpoint(),
            api_key: String::new(),
            api_secret: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

fn default_mail_endpoint() -> String {
    "https://api.mailjet.com/v3.1/send".to_string()
}

fn default_from_email() -> String {
    "soporte@reparto.local".to_string()
}

fn default_from_name() -> String {
    "Soporte".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErpConfig {
    /// Endpoint that receives finalized orders.
    #[serde(default = "default_erp_endpoint")]
    pub endpoint: String,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_erp_endpoint(),
        }
    }
}

fn default_erp_endpoint() -> String {
    "https://calidad-api-sap-crm.yes.com.sv/insertar-pedido-solo-sap/".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// SQL-over-HTTP gateway for the purchase-history feed.
    #[serde(default = "default_history_endpoint")]
    pub endpoint: String,
    /// Database host the gateway should query.
    #[serde(default = "default_history_db_host")]
    pub db_host: String,
    #[serde(default = "default_history_db_name")]
    pub db_name: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_history_endpoint(),
            db_host: default_history_db_host(),
            db_name: default_history_db_name(),
        }
    }
}

fn default_history_endpoint() -> String {
    "https://pg-api.yes.com.sv/select".to_string()
}

fn default_history_db_host() -> String {
    "192.168.101.77".to_string()
}

fn default_history_db_name() -> String {
    "yesentregas".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origin of the SPA frontend.
    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            frontend_origin: default_frontend_origin(),
        }
    }
}

fn default_frontend_origin() -> String {
    "http://localhost:5173".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets come from the environment when present, so config files can be
    /// committed without credentials.
    fn apply_env_overrides(&mut self) {
        if let Ok(password) = std::env::var("REPARTO_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Ok(secret) = std::env::var("REPARTO_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(key) = std::env::var("MAILJET_API_KEY") {
            self.mail.api_key = key;
        }
        if let Ok(secret) = std::env::var("MAILJET_API_SECRET") {
            self.mail.api_secret = secret;
        }
        if let Ok(origin) = std::env::var("FRONTEND_URL") {
            self.cors.frontend_origin = origin;
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            mail: MailConfig::default(),
            erp: ErpConfig::default(),
            history: HistoryConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

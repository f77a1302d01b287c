//! Server configuration.
//!
//! Layered: optional config file, then environment variables with the
//! `NAIREX__` prefix, then CLI overrides applied in `main`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub swap: SwapSettings,

    #[serde(default)]
    pub webhook: WebhookSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener binding and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request read/write budget in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Keep-alive idle budget in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Metadata store connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: default_database_url(), max_connections: default_max_connections() }
    }
}

/// Ledger engine addressing. The comma-separated endpoint list is kept for
/// deployments that point the gateway at an external engine cluster; the
/// embedded engine ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_addresses")]
    pub addresses: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { addresses: default_ledger_addresses() }
    }
}

impl LedgerConfig {
    pub fn address_list(&self) -> Vec<String> {
        self.addresses.split(',').map(|s| s.trim().to_string()).collect()
    }
}

/// Swap protocol knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapSettings {
    /// Quotation lifetime before automatic reversal, in milliseconds.
    #[serde(default = "default_pending_ttl_ms")]
    pub pending_ttl_ms: u64,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self { pending_ttl_ms: default_pending_ttl_ms() }
    }
}

impl SwapSettings {
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_millis(self.pending_ttl_ms)
    }
}

/// Webhook pacing knobs (legacy contract defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Pause before each POST, in seconds.
    #[serde(default = "default_webhook_delay")]
    pub pre_delay_secs: u64,

    /// Gap between the deposit two-shot events, in seconds.
    #[serde(default = "default_webhook_delay")]
    pub deposit_gap_secs: u64,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            pre_delay_secs: default_webhook_delay(),
            deposit_gap_secs: default_webhook_delay(),
        }
    }
}

impl WebhookSettings {
    pub fn pre_delay(&self) -> Duration {
        Duration::from_secs(self.pre_delay_secs)
    }

    pub fn deposit_gap(&self) -> Duration {
        Duration::from_secs(self.deposit_gap_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    15
}

fn default_idle_timeout() -> u64 {
    60
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_database_url() -> String {
    "sqlite://nairex.db".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_ledger_addresses() -> String {
    "127.0.0.1:3003".to_string()
}

fn default_pending_ttl_ms() -> u64 {
    12_000
}

fn default_webhook_delay() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl ServerConfig {
    /// Load from an optional file plus `NAIREX__`-prefixed environment
    /// variables.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("NAIREX")
                    .separator("__")
                    .try_parsing(true),
            );

        let loaded = builder.build()?;
        let server_config = loaded.try_deserialize().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default configuration");
            ServerConfig::default()
        });
        Ok(server_config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseConfig::default(),
            ledger: LedgerConfig::default(),
            swap: SwapSettings::default(),
            webhook: WebhookSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

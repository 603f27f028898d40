//! Typed configuration surface, loaded from TOML (§3.6, §6.2).
//!
//! Only `servers.market.{ip,port}` are consumed by the core; every other section is
//! present so a richer fleet config file deserializes without the core needing to act on
//! every field, and implements `Default` so a minimal `[servers.market]`-only file loads.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub servers: ServersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServersConfig {
    pub market: ServerConfig,
    #[serde(default)]
    pub beta: Option<ServerConfig>,
    #[serde(default)]
    pub risk: Option<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
    pub log_to_file: bool,
    pub log_path: Option<String>,
    pub max_file_size_mb: u64,
    pub rotation_count: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            log_to_file: false,
            log_path: None,
            max_file_size_mb: 100,
            rotation_count: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub enabled: bool,
    pub strategy: String,
    pub max_position_size: f64,
    pub max_order_size: f64,
    pub risk_limit_usd: f64,
    pub tick_size: f64,
    pub latency_threshold_us: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: "simple_spread".to_string(),
            max_position_size: 1000.0,
            max_order_size: 100.0,
            risk_limit_usd: 10_000.0,
            tick_size: 0.01,
            latency_threshold_us: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub tcp_buffer_size: u32,
    pub udp_buffer_size: u32,
    pub socket_timeout_ms: u64,
    pub keepalive_interval_s: u64,
    pub max_connections: u32,
    pub enable_nagle: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            tcp_buffer_size: 65536,
            udp_buffer_size: 65536,
            socket_timeout_ms: 5000,
            keepalive_interval_s: 30,
            max_connections: 10,
            enable_nagle: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub num_threads: u32,
    pub cpu_affinity: Vec<usize>,
    pub use_huge_pages: bool,
    pub priority: i32,
    pub watchdog_timeout_s: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            num_threads: 3,
            cpu_affinity: Vec::new(),
            use_huge_pages: false,
            priority: 0,
            watchdog_timeout_s: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        let config: Config = toml::from_str(&raw).context("failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// The CPU ids to pin the three pipeline threads to — `system.cpu_affinity` if
    /// non-empty, else the default `[0, 1, 2]` (§3.6, §4.6).
    pub fn pipeline_cpu_affinity(&self) -> [usize; 3] {
        let ids = &self.system.cpu_affinity;
        if ids.len() >= 3 {
            [ids[0], ids[1], ids[2]]
        } else {
            [0, 1, 2]
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.servers.market.port == 0 {
            bail!("servers.market.port must be nonzero");
        }

        if self.trading.tick_size <= 0.0 {
            bail!("trading.tick_size must be positive, got {}", self.trading.tick_size);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "invalid logging.level '{}', must be one of: {:?}",
                self.logging.level,
                valid_log_levels
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_deserializes_with_defaults_elsewhere() {
        let toml_str = r#"
            [servers.market]
            ip = "127.0.0.1"
            port = 7878
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.servers.market.ip, "127.0.0.1");
        assert_eq!(config.servers.market.port, 7878);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.trading.tick_size, 0.01);
        assert!(config.system.cpu_affinity.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let toml_str = r#"
            [servers.market]
            ip = "127.0.0.1"
            port = 0
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn non_positive_tick_size_is_rejected() {
        let toml_str = r#"
            [servers.market]
            ip = "127.0.0.1"
            port = 7878

            [trading]
            tick_size = 0.0
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tick_size"));
    }

    #[test]
    fn cpu_affinity_defaults_to_zero_one_two_when_empty() {
        let toml_str = r#"
            [servers.market]
            ip = "127.0.0.1"
            port = 7878
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pipeline_cpu_affinity(), [0, 1, 2]);
    }

    #[test]
    fn explicit_cpu_affinity_is_honored() {
        let toml_str = r#"
            [servers.market]
            ip = "127.0.0.1"
            port = 7878

            [system]
            cpu_affinity = [4, 5, 6]
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pipeline_cpu_affinity(), [4, 5, 6]);
    }
}

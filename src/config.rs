//! Configuration types for the wallet connectors
//!
//! Manages global configuration: which backend the CLI drives, the funding
//! retry policy, the simulated ledger's faucet, and the Bitcoin / F1r3fly
//! node and faucet endpoints.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Backend used by the CLI
    pub connector: ConnectorKind,
    pub funding: FundingConfig,
    pub memory: MemoryLedgerConfig,
    pub bitcoin: BitcoinConfig,
    pub f1r3fly: F1r3flyConfig,
    /// Optional custom data directory (vault, ledger database)
    pub data_dir: Option<String>,
}

/// Available wallet connector backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Memory,
    Bitcoin,
    F1r3fly,
}

impl std::str::FromStr for ConnectorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(ConnectorKind::Memory),
            "bitcoin" => Ok(ConnectorKind::Bitcoin),
            "f1r3fly" => Ok(ConnectorKind::F1r3fly),
            _ => Err(ConfigError::InvalidConnector(s.to_string())),
        }
    }
}

/// Funding retry policy for `ensure_balance`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingConfig {
    /// Maximum faucet requests per `ensure_balance` call
    pub max_attempts: u32,
    /// Fixed pause between attempts, in milliseconds
    pub backoff_ms: u64,
    /// Per-attempt faucet timeout when the caller gives none
    pub default_timeout_secs: u64,
}

impl FundingConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_ms: 500,
            default_timeout_secs: 60,
        }
    }
}

/// Simulated ledger and its faucet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryLedgerConfig {
    /// Amount minted per faucet request
    #[serde(with = "crate::amount::decimal_string")]
    pub fund_amount: BigUint,
    /// Faucet refuses to fund addresses at or above this balance
    #[serde(default, with = "crate::amount::optional_decimal_string")]
    pub balance_cap: Option<BigUint>,
    /// SQLite file for the ledger (defaults to `<data_dir>/ledger.db`)
    pub database: Option<String>,
}

impl Default for MemoryLedgerConfig {
    fn default() -> Self {
        Self {
            fund_amount: BigUint::from(1_000_000_000u64),
            balance_cap: None,
            database: None,
        }
    }
}

/// Bitcoin network and node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinConfig {
    pub network: NetworkType,
    /// Ledger node RPC base URL
    pub node_url: String,
    /// Faucet endpoint, if the network has one
    pub faucet_url: Option<String>,
    /// Interval between balance polls while waiting for faucet funds
    pub faucet_poll_ms: u64,
    /// Addresses per chain scanned to locate a transfer's source key
    pub address_scan_limit: u32,
}

/// F1r3node connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct F1r3flyConfig {
    pub host: String,
    pub http_port: u16,
    /// BIP44 coin type for F1r3fly keys
    pub coin_type: u32,
    /// Faucet endpoint, if the network has one
    pub faucet_url: Option<String>,
    /// Interval between balance polls while waiting for faucet funds
    pub faucet_poll_ms: u64,
    /// Addresses per chain scanned to locate a transfer's source key
    pub address_scan_limit: u32,
}

impl F1r3flyConfig {
    /// HTTP base URL of the F1r3node
    pub fn node_url(&self) -> String {
        format!("http://{}:{}", self.host, self.http_port)
    }
}

/// Bitcoin network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Regtest,
    Signet,
    Testnet,
    Mainnet,
}

impl std::str::FromStr for NetworkType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regtest" => Ok(NetworkType::Regtest),
            "signet" => Ok(NetworkType::Signet),
            "testnet" => Ok(NetworkType::Testnet),
            "mainnet" => Ok(NetworkType::Mainnet),
            _ => Err(ConfigError::InvalidNetwork(s.to_string())),
        }
    }
}

/// Default ledger node URL for a Bitcoin network
pub fn default_bitcoin_node_url(network: NetworkType) -> String {
    match network {
        NetworkType::Regtest => "http://localhost:3002".to_string(),
        NetworkType::Signet => "https://mempool.space/signet/api".to_string(),
        NetworkType::Testnet => "https://mempool.space/testnet/api".to_string(),
        NetworkType::Mainnet => "https://mempool.space/api".to_string(),
    }
}

impl BitcoinConfig {
    fn for_network(network: NetworkType) -> Self {
        let faucet_url = match network {
            NetworkType::Regtest => Some("http://localhost:3003/faucet".to_string()),
            _ => None,
        };
        Self {
            network,
            node_url: default_bitcoin_node_url(network),
            faucet_url,
            faucet_poll_ms: 1_000,
            address_scan_limit: 20,
        }
    }
}

impl Default for F1r3flyConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            http_port: 40403,
            coin_type: crate::derivation::F1R3FLY_COIN_TYPE,
            faucet_url: None,
            faucet_poll_ms: 1_000,
            address_scan_limit: 20,
        }
    }
}

impl GlobalConfig {
    /// Default configuration for a Bitcoin network
    pub fn for_network(network: NetworkType) -> Self {
        Self {
            connector: ConnectorKind::Memory,
            funding: FundingConfig::default(),
            memory: MemoryLedgerConfig::default(),
            bitcoin: BitcoinConfig::for_network(network),
            f1r3fly: F1r3flyConfig::default(),
            data_dir: None,
        }
    }

    /// Create default configuration for regtest
    pub fn default_regtest() -> Self {
        Self::for_network(NetworkType::Regtest)
    }

    /// Resolved data directory (custom or `~/.wallet-connectors/`)
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => default_config_dir(),
        }
    }

    /// Resolved ledger database path
    pub fn ledger_database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.memory.database {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(self.data_dir()?.join("ledger.db")),
        }
    }

    /// Resolved vault file path
    pub fn vault_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join("vault.json"))
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self::default_regtest()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    #[error("Invalid connector: {0} (use memory, bitcoin or f1r3fly)")]
    InvalidConnector(String),

    #[error("Config directory not found")]
    DirectoryNotFound,
}

/// Configuration overrides from CLI arguments or environment variables
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub connector: Option<ConnectorKind>,
    pub network: Option<NetworkType>,
    pub bitcoin_node_url: Option<String>,
    pub bitcoin_faucet_url: Option<String>,
    pub f1r3node_host: Option<String>,
    pub f1r3node_http_port: Option<u16>,
    pub f1r3fly_faucet_url: Option<String>,
    pub data_dir: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Create overrides from environment variables
    ///
    /// Unparseable values are ignored rather than rejected.
    pub fn from_env() -> Self {
        Self {
            connector: std::env::var("WALLET_CONNECTOR")
                .ok()
                .and_then(|s| s.parse().ok()),
            network: std::env::var("BITCOIN_NETWORK")
                .ok()
                .and_then(|s| s.parse().ok()),
            bitcoin_node_url: std::env::var("BITCOIN_NODE_URL").ok(),
            bitcoin_faucet_url: std::env::var("BITCOIN_FAUCET_URL").ok(),
            f1r3node_host: std::env::var("FIREFLY_HOST")
                .or_else(|_| std::env::var("F1R3NODE_HOST"))
                .ok(),
            f1r3node_http_port: std::env::var("FIREFLY_HTTP_PORT")
                .or_else(|_| std::env::var("F1R3NODE_HTTP_PORT"))
                .ok()
                .and_then(|s| s.parse().ok()),
            f1r3fly_faucet_url: std::env::var("FIREFLY_FAUCET_URL").ok(),
            data_dir: std::env::var("WALLET_DATA_DIR").ok(),
        }
    }

    /// Merge with another set of overrides (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.connector.is_some() {
            self.connector = other.connector;
        }
        if other.network.is_some() {
            self.network = other.network;
        }
        if other.bitcoin_node_url.is_some() {
            self.bitcoin_node_url = other.bitcoin_node_url;
        }
        if other.bitcoin_faucet_url.is_some() {
            self.bitcoin_faucet_url = other.bitcoin_faucet_url;
        }
        if other.f1r3node_host.is_some() {
            self.f1r3node_host = other.f1r3node_host;
        }
        if other.f1r3node_http_port.is_some() {
            self.f1r3node_http_port = other.f1r3node_http_port;
        }
        if other.f1r3fly_faucet_url.is_some() {
            self.f1r3fly_faucet_url = other.f1r3fly_faucet_url;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        self
    }
}

/// Get the default configuration directory path
///
/// Returns: `~/.wallet-connectors/`
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".wallet-connectors"))
        .ok_or(ConfigError::DirectoryNotFound)
}

/// Get the default configuration file path
///
/// Returns: `~/.wallet-connectors/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_dir()?.join("config.json"))
}

/// Load configuration from file with overrides
///
/// # Priority (highest to lowest):
/// 1. CLI overrides (passed as argument)
/// 2. Environment variables
/// 3. Config file
/// 4. Network defaults
///
/// # Arguments
///
/// * `config_path` - Path to config file (optional, uses default if None)
/// * `cli_overrides` - Overrides from CLI arguments
///
/// # Example
///
/// ```ignore
/// use f1r3fly_wallet_connectors::config::{load_config, ConfigOverrides, ConnectorKind};
///
/// let mut cli_overrides = ConfigOverrides::new();
/// cli_overrides.connector = Some(ConnectorKind::Memory);
///
/// let config = load_config(None, cli_overrides)?;
/// ```
pub fn load_config(
    config_path: Option<&Path>,
    cli_overrides: ConfigOverrides,
) -> Result<GlobalConfig, ConfigError> {
    let env_overrides = ConfigOverrides::from_env();
    load_config_with(config_path, env_overrides, cli_overrides)
}

/// Load configuration with explicit environment overrides
///
/// Same as [`load_config`] but does not read the process environment.
///
/// # Arguments
///
/// * `config_path` - Path to config file (optional, uses default if None)
/// * `env_overrides` - Overrides standing in for environment variables
/// * `cli_overrides` - Overrides from CLI arguments
///
/// # Returns
///
/// The merged configuration, or `ConfigError::Invalid` when the funding
/// policy or scan limits are unusable
pub fn load_config_with(
    config_path: Option<&Path>,
    env_overrides: ConfigOverrides,
    cli_overrides: ConfigOverrides,
) -> Result<GlobalConfig, ConfigError> {
    // Determine config path
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    let mut config = if path.exists() {
        // Load from file if it exists
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)?
    } else {
        // Network defaults (regtest unless an override names one)
        let network = cli_overrides
            .network
            .or(env_overrides.network)
            .unwrap_or(NetworkType::Regtest);
        GlobalConfig::for_network(network)
    };

    // Apply environment variable overrides
    apply_overrides(&mut config, env_overrides);

    // Apply CLI overrides (highest priority)
    apply_overrides(&mut config, cli_overrides);

    validate(&config)?;

    Ok(config)
}

/// Save configuration to file
///
/// Creates parent directories if they don't exist.
///
/// # Arguments
///
/// * `config` - Configuration to save
/// * `config_path` - Path to save config (optional, uses default if None)
///
/// # Example
///
/// ```ignore
/// use f1r3fly_wallet_connectors::config::{save_config, GlobalConfig};
///
/// let config = GlobalConfig::default_regtest();
/// save_config(&config, None)?;
/// ```
pub fn save_config(config: &GlobalConfig, config_path: Option<&Path>) -> Result<(), ConfigError> {
    // Determine config path
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Serialize to pretty JSON
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;

    Ok(())
}

fn validate(config: &GlobalConfig) -> Result<(), ConfigError> {
    if config.funding.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "funding.max_attempts must be at least 1".to_string(),
        ));
    }
    if config.funding.default_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "funding.default_timeout_secs must be positive".to_string(),
        ));
    }
    if config.bitcoin.address_scan_limit == 0 || config.f1r3fly.address_scan_limit == 0 {
        return Err(ConfigError::Invalid(
            "address_scan_limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Apply configuration overrides (internal helper)
fn apply_overrides(config: &mut GlobalConfig, overrides: ConfigOverrides) {
    if let Some(connector) = overrides.connector {
        config.connector = connector;
    }

    // Network change moves the node URL along unless it is overridden too
    if let Some(network) = overrides.network {
        if config.bitcoin.network != network {
            config.bitcoin.network = network;
            if overrides.bitcoin_node_url.is_none() {
                config.bitcoin.node_url = default_bitcoin_node_url(network);
            }
        }
    }

    // Apply bitcoin node and faucet overrides
    if let Some(url) = overrides.bitcoin_node_url {
        config.bitcoin.node_url = url;
    }
    if let Some(url) = overrides.bitcoin_faucet_url {
        config.bitcoin.faucet_url = Some(url);
    }

    // Apply f1r3node overrides
    if let Some(host) = overrides.f1r3node_host {
        config.f1r3fly.host = host;
    }
    if let Some(port) = overrides.f1r3node_http_port {
        config.f1r3fly.http_port = port;
    }
    if let Some(url) = overrides.f1r3fly_faucet_url {
        config.f1r3fly.faucet_url = Some(url);
    }

    // Apply data directory override
    if let Some(data_dir) = overrides.data_dir {
        config.data_dir = Some(data_dir);
    }
}

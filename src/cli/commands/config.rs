//! Config command implementations

use crate::config::{
    default_config_path, load_config, save_config, ConfigError, ConfigOverrides, GlobalConfig,
    NetworkType,
};

/// Initialize configuration file with network-specific defaults
pub fn init(overrides: ConfigOverrides) -> Result<(), ConfigError> {
    let network = overrides.network.unwrap_or(NetworkType::Regtest);

    let mut config = GlobalConfig::for_network(network);
    if let Some(connector) = overrides.connector {
        config.connector = connector;
    }
    if let Some(dir) = overrides.data_dir {
        config.data_dir = Some(dir);
    }

    save_config(&config, None)?;

    let config_path = default_config_path()?;
    println!("✓ Configuration initialized for {:?}", network);
    println!("  Connector:   {:?}", config.connector);
    println!("  Config file: {}", config_path.display());

    Ok(())
}

/// Print the effective configuration after overrides
pub fn show(overrides: ConfigOverrides) -> Result<(), ConfigError> {
    let config = load_config(None, overrides)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

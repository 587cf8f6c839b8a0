//! CLI command implementations

pub mod config;
pub mod funding;
pub mod identity;
pub mod transfer;
pub mod wallet;

use std::sync::Arc;

use crate::amount::AmountError;
use crate::config::{load_config, ConfigError, ConfigOverrides};
use crate::manager::{ManagerError, WalletManager};
use crate::storage::FileKeyVault;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Manager(#[from] ManagerError),

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),
}

/// Load config and open a manager over the password-protected vault
pub(crate) fn open_manager(
    overrides: ConfigOverrides,
    password: &str,
) -> Result<WalletManager, CommandError> {
    let config = load_config(None, overrides)?;
    let vault = Arc::new(FileKeyVault::new(config.vault_path()?, password));
    Ok(WalletManager::new(config, vault)?)
}

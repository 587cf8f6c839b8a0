//! Identity command implementations

use crate::config::ConfigOverrides;

use super::{open_manager, CommandError};

/// Create a new identity with a generated mnemonic
pub async fn create(
    name: String,
    password: String,
    overrides: ConfigOverrides,
) -> Result<(), CommandError> {
    let manager = open_manager(overrides, &password)?;
    manager.create_identity(&name).await?;

    let first = manager.addresses(&name, 0, 0, 1, false).await?;

    println!("✓ Identity '{}' created successfully", name);
    println!();
    println!("  Connector:     {}", manager.wallet().name());
    if let Some(address) = first.first() {
        println!("  First Address: {}", address);
    }
    println!();
    println!("  The recovery phrase is stored encrypted in the vault.");

    Ok(())
}

/// Import an existing identity from a mnemonic phrase
pub async fn import(
    name: String,
    mnemonic: String,
    password: String,
    overrides: ConfigOverrides,
) -> Result<(), CommandError> {
    let manager = open_manager(overrides, &password)?;
    manager.import_identity(&name, &mnemonic).await?;

    let first = manager.addresses(&name, 0, 0, 1, false).await?;

    println!("✓ Identity '{}' imported successfully", name);
    if let Some(address) = first.first() {
        println!("  First Address: {}", address);
    }

    Ok(())
}

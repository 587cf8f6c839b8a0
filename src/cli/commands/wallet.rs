//! Address and balance command implementations

use crate::config::ConfigOverrides;

use super::{open_manager, CommandError};

/// Derive and print addresses for an identity
pub async fn get_addresses(
    identity: String,
    account: u32,
    start: u32,
    count: u32,
    internal: bool,
    password: String,
    overrides: ConfigOverrides,
) -> Result<(), CommandError> {
    let manager = open_manager(overrides, &password)?;
    let addresses = manager
        .addresses(&identity, account, start, count, internal)
        .await?;

    println!(
        "{} addresses for '{}' (account {}):",
        if internal { "Change" } else { "Receive" },
        identity,
        account
    );
    for (offset, address) in addresses.iter().enumerate() {
        println!("  [{}] {}", start as usize + offset, address);
    }

    Ok(())
}

/// Print the balance held at an address
pub async fn get_balance(
    identity: String,
    address: String,
    password: String,
    overrides: ConfigOverrides,
) -> Result<(), CommandError> {
    let manager = open_manager(overrides, &password)?;
    let balance = manager.balance(&identity, &address).await?;

    println!("Balance of {}: {}", address, balance);

    Ok(())
}

//! Transfer command implementation

use crate::amount::parse_positive_amount;
use crate::config::ConfigOverrides;

use super::{open_manager, CommandError};

pub async fn transfer(
    identity: String,
    from: String,
    to: String,
    amount: String,
    password: String,
    overrides: ConfigOverrides,
) -> Result<(), CommandError> {
    let amount = parse_positive_amount(&amount)?;
    let manager = open_manager(overrides, &password)?;
    let txid = manager.transfer(&identity, &from, &to, &amount).await?;

    println!("✓ Transferred {} from {} to {}", amount, from, to);
    if let Some(txid) = txid {
        println!("  Transaction: {}", txid);
    }

    Ok(())
}

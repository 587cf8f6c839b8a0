//! Wallet connectors CLI
//!
//! Command-line interface for deriving addresses, funding them from faucets
//! and transferring value through the configured connector

use clap::Parser;
use f1r3fly_wallet_connectors::cli::args::{Cli, Commands, ConfigAction, IdentityAction};
use f1r3fly_wallet_connectors::cli::commands;
use f1r3fly_wallet_connectors::config::{ConfigOverrides, ConnectorKind, NetworkType};
use std::process;

fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let network = cli.network.as_ref().map(|n| match n.parse::<NetworkType>() {
        Ok(network) => network,
        Err(_) => {
            eprintln!(
                "Error: Invalid network '{}'. Use: regtest, signet, testnet, or mainnet",
                n
            );
            process::exit(1);
        }
    });

    let connector = cli.connector.as_ref().map(|c| match c.parse::<ConnectorKind>() {
        Ok(connector) => connector,
        Err(_) => {
            eprintln!(
                "Error: Invalid connector '{}'. Use: memory, bitcoin, or f1r3fly",
                c
            );
            process::exit(1);
        }
    });

    // Build config overrides from global arguments
    let overrides = ConfigOverrides {
        connector,
        network,
        bitcoin_node_url: cli.bitcoin_node_url.clone(),
        bitcoin_faucet_url: cli.bitcoin_faucet_url.clone(),
        f1r3node_host: cli.f1r3node_host.clone(),
        f1r3node_http_port: cli.f1r3node_http_port,
        f1r3fly_faucet_url: cli.f1r3fly_faucet_url.clone(),
        data_dir: cli.data_dir.clone(),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create async runtime: {}", e);
            process::exit(1);
        }
    };

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init => commands::config::init(overrides).map_err(Into::into),
            ConfigAction::Show => commands::config::show(overrides).map_err(Into::into),
        },

        Commands::Identity { action } => match action {
            IdentityAction::Create { name, password } => rt
                .block_on(commands::identity::create(name, password, overrides))
                .map_err(Into::into),

            IdentityAction::Import {
                name,
                mnemonic,
                password,
            } => rt
                .block_on(commands::identity::import(name, mnemonic, password, overrides))
                .map_err(Into::into),
        },

        Commands::GetAddresses {
            identity,
            account,
            start,
            count,
            internal,
            password,
        } => rt
            .block_on(commands::wallet::get_addresses(
                identity, account, start, count, internal, password, overrides,
            ))
            .map_err(Into::into),

        Commands::GetBalance {
            identity,
            address,
            password,
        } => rt
            .block_on(commands::wallet::get_balance(
                identity, address, password, overrides,
            ))
            .map_err(Into::into),

        Commands::Fund {
            identity,
            address,
            timeout,
            password,
        } => rt
            .block_on(commands::funding::fund(
                identity, address, timeout, password, overrides,
            ))
            .map_err(Into::into),

        Commands::EnsureBalance {
            identity,
            address,
            target,
            timeout,
            password,
        } => rt
            .block_on(commands::funding::ensure_balance(
                identity, address, target, timeout, password, overrides,
            ))
            .map_err(Into::into),

        Commands::Transfer {
            identity,
            from,
            to,
            amount,
            password,
        } => rt
            .block_on(commands::transfer::transfer(
                identity, from, to, amount, password, overrides,
            ))
            .map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

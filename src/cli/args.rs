//! CLI argument definitions using clap

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "wallet-connectors",
    version,
    about = "Wallet connectors - derive addresses, fund them from faucets and move value",
    long_about = None
)]
pub struct Cli {
    /// Connector backend: memory, bitcoin, f1r3fly (overrides config)
    #[arg(short, long, global = true)]
    pub connector: Option<String>,

    /// Bitcoin network: regtest, signet, testnet, mainnet (overrides config)
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Bitcoin ledger node URL (overrides config)
    #[arg(long, global = true)]
    pub bitcoin_node_url: Option<String>,

    /// Bitcoin faucet endpoint (overrides config)
    #[arg(long, global = true)]
    pub bitcoin_faucet_url: Option<String>,

    /// F1r3node host (overrides config)
    #[arg(long, global = true)]
    pub f1r3node_host: Option<String>,

    /// F1r3node HTTP port (overrides config)
    #[arg(long, global = true)]
    pub f1r3node_http_port: Option<u16>,

    /// F1r3fly faucet endpoint (overrides config)
    #[arg(long, global = true)]
    pub f1r3fly_faucet_url: Option<String>,

    /// Custom data directory for the vault and ledger
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize or manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Identity management commands
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    /// Derive addresses for an identity
    GetAddresses {
        /// Identity to derive for
        identity: String,

        /// Account index
        #[arg(long, default_value = "0")]
        account: u32,

        /// First address index
        #[arg(long, default_value = "0")]
        start: u32,

        /// Number of addresses to show (default: 5)
        #[arg(short = 'k', long, default_value = "5")]
        count: u32,

        /// Derive change addresses instead of receive addresses
        #[arg(long)]
        internal: bool,

        /// Password to decrypt the vault
        #[arg(short, long)]
        password: String,
    },

    /// Get the balance held at an address
    GetBalance {
        identity: String,

        address: String,

        /// Password to decrypt the vault
        #[arg(short, long)]
        password: String,
    },

    /// Request one round of faucet funds for an address
    Fund {
        identity: String,

        address: String,

        /// Seconds to wait for the funds to arrive
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Password to decrypt the vault
        #[arg(short, long)]
        password: String,
    },

    /// Fund an address until it holds a target balance
    EnsureBalance {
        identity: String,

        address: String,

        /// Target balance in base units
        #[arg(long)]
        target: String,

        /// Per-attempt faucet timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Password to decrypt the vault
        #[arg(short, long)]
        password: String,
    },

    /// Transfer value between addresses
    Transfer {
        identity: String,

        /// Source address
        #[arg(short, long)]
        from: String,

        /// Destination address
        #[arg(short, long)]
        to: String,

        /// Amount in base units
        #[arg(short, long)]
        amount: String,

        /// Password to decrypt the vault
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize configuration file with defaults
    ///
    /// Uses the global --network and --connector flags (regtest and memory
    /// when omitted).
    Init,

    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
pub enum IdentityAction {
    /// Create a new identity with a generated mnemonic
    Create {
        /// Name of the identity
        name: String,

        /// Password to encrypt the vault
        #[arg(short, long)]
        password: String,
    },

    /// Import an existing identity from a mnemonic phrase
    Import {
        /// Name of the identity
        name: String,

        /// BIP39 mnemonic phrase (12 or 24 words)
        #[arg(short, long)]
        mnemonic: String,

        /// Password to encrypt the vault
        #[arg(short, long)]
        password: String,
    },
}

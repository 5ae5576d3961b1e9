pub mod keys;
pub mod ops;
pub mod tx;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "signet")]
#[command(about = "Signet token ledger CLI", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "signet.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a fresh keypair and write it to a key file
    Keygen {
        #[arg(long, default_value = "key.json")]
        out: String,
    },
    /// Initialize the ledger, crediting the key's address with the supply
    Init {
        #[arg(long)]
        initial_supply: i128,
        #[arg(long)]
        decimals: i32,
        /// Key file of the initializing identity (defaults to the config's)
        #[arg(long)]
        key: Option<String>,
    },
    /// Show token metadata
    Info,
    /// Show the balance of an address
    Balance { address: String },
    /// Transfer tokens, authorized as the key file's address
    Transfer {
        #[arg(long)]
        to: String,
        #[arg(long)]
        value: i128,
        #[arg(long)]
        key: Option<String>,
        /// Optional data handed to a contract recipient
        #[arg(long)]
        data: Option<String>,
    },
    /// Sign a relay envelope for a third party to submit
    Sign {
        #[arg(long)]
        to: String,
        #[arg(long)]
        value: u128,
        #[arg(long)]
        nonce: u64,
        #[arg(long)]
        key: Option<String>,
        /// Write the envelope here instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
    /// Submit a relay envelope; the transfer is authorized by its signature
    Remote {
        /// Path to the envelope file
        payload: String,
    },
}

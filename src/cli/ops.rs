//! Ledger operations: init and the pure reads.

use crate::address::Address;
use crate::cli::keys;
use crate::config::SignetConfig;
use crate::error::SignetError;
use crate::token::{DbLedger, Token, TokenMetadata};

/// Open the persistent token service described by the config.
pub fn open_token(config: &SignetConfig) -> Result<Token<DbLedger>, SignetError> {
    let ledger = DbLedger::open(&config.node.db_path)?;
    Ok(Token::new(
        ledger,
        TokenMetadata {
            name: config.token.name.clone(),
            symbol: config.token.symbol.clone(),
        },
    ))
}

fn key_path<'a>(config: &'a SignetConfig, key: &'a Option<String>) -> &'a str {
    key.as_deref().unwrap_or(&config.node.key_file)
}

pub fn handle_init(
    config: &SignetConfig,
    initial_supply: i128,
    decimals: i32,
    key: &Option<String>,
) -> Result<(), SignetError> {
    let keys = keys::load_keypair(key_path(config, key))?;
    let mut token = open_token(config)?;

    token.init(&keys.address(), initial_supply, decimals)?;
    token.store().flush()?;

    println!(
        "Initialized {} ({}): total supply {} credited to {}",
        token.name(),
        token.symbol(),
        token.total_supply(),
        keys.address()
    );
    Ok(())
}

pub fn handle_info(config: &SignetConfig) -> Result<(), SignetError> {
    let token = open_token(config)?;
    println!("Name:         {}", token.name());
    println!("Symbol:       {}", token.symbol());
    println!("Decimals:     {}", token.decimals());
    println!("Total supply: {}", token.total_supply());
    Ok(())
}

pub fn handle_balance(config: &SignetConfig, address: &str) -> Result<(), SignetError> {
    let owner: Address = address.parse()?;
    let token = open_token(config)?;
    println!("{}", token.balance_of(&owner));
    Ok(())
}

//! Transfer commands: the direct path, the client-side signer and the
//! relay submission path.

use std::fs;

use crate::address::Address;
use crate::cli::keys;
use crate::cli::ops::open_token;
use crate::config::SignetConfig;
use crate::error::SignetError;
use crate::relay::build_signed;

pub fn handle_transfer(
    config: &SignetConfig,
    to: &str,
    value: i128,
    key: &Option<String>,
    data: &Option<String>,
) -> Result<(), SignetError> {
    let keys = keys::load_keypair(key.as_deref().unwrap_or(&config.node.key_file))?;
    let to: Address = to.parse()?;
    let mut token = open_token(config)?;

    let data = data.as_ref().map(|s| s.as_bytes());
    token.transfer(&keys.address(), &to, value, data)?;
    token.store().flush()?;

    println!("Transferred {} from {} to {}", value, keys.address(), to);
    Ok(())
}

pub fn handle_sign(
    config: &SignetConfig,
    to: &str,
    value: u128,
    nonce: u64,
    key: &Option<String>,
    out: &Option<String>,
) -> Result<(), SignetError> {
    let keys = keys::load_keypair(key.as_deref().unwrap_or(&config.node.key_file))?;
    let to: Address = to.parse()?;

    let payload = build_signed(&keys, &to, value, nonce)?;
    match out {
        Some(path) => {
            fs::write(path, &payload)?;
            println!("Wrote signed envelope to '{}'", path);
        }
        None => println!("{}", String::from_utf8_lossy(&payload)),
    }
    Ok(())
}

pub fn handle_remote(config: &SignetConfig, payload_path: &str) -> Result<(), SignetError> {
    let payload = fs::read(payload_path)?;
    let mut token = open_token(config)?;

    let receipt = token.remote_transfer(&payload)?;
    token.store().flush()?;

    println!("Applied relayed transfer: {}", receipt);
    Ok(())
}

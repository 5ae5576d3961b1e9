//! Key file management.
//!
//! Key files are plain JSON (address + hex secret key). There is no
//! password layer here: the file itself is the credential, so keep it out
//! of shared directories.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::crypto::KeyPair;
use crate::error::SignetError;

#[derive(Serialize, Deserialize)]
pub struct KeyFile {
    pub address: String,
    pub secret_key: String,
}

pub fn save_keypair(keys: &KeyPair, path: &str) -> Result<(), SignetError> {
    let file = KeyFile {
        address: keys.address().to_string(),
        secret_key: keys.secret_hex(),
    };
    let json =
        serde_json::to_string_pretty(&file).map_err(|e| SignetError::KeyFile(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_keypair(path: &str) -> Result<KeyPair, SignetError> {
    if !Path::new(path).exists() {
        return Err(SignetError::KeyFile(format!("key file not found: {}", path)));
    }
    let content = fs::read_to_string(path)?;
    let file: KeyFile =
        serde_json::from_str(&content).map_err(|e| SignetError::KeyFile(e.to_string()))?;
    let keys = KeyPair::from_secret_hex(&file.secret_key)?;

    // Integrity: the stored address must match the secret key.
    if keys.address().to_string() != file.address {
        return Err(SignetError::KeyFile(
            "key file address does not match its secret key".to_string(),
        ));
    }
    Ok(keys)
}

pub fn handle_keygen(out: &str) -> Result<(), SignetError> {
    if Path::new(out).exists() {
        return Err(SignetError::KeyFile(format!(
            "refusing to overwrite existing key file: {}",
            out
        )));
    }
    let keys = KeyPair::generate();
    save_keypair(&keys, out)?;
    println!("Created key file '{}' for {}", out, keys.address());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyfile_roundtrip() {
        let dir = std::env::temp_dir().join("signet-keyfile-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("key.json");
        let path = path.to_str().unwrap();
        let _ = std::fs::remove_file(path);

        let keys = KeyPair::generate();
        save_keypair(&keys, path).unwrap();
        let loaded = load_keypair(path).unwrap();
        assert_eq!(loaded.address(), keys.address());

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_keypair("/nonexistent/key.json").is_err());
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SignetConfig {
    pub token: TokenSection,
    pub node: NodeSection,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenSection {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeSection {
    pub db_path: String,
    pub log_level: String,
    #[serde(default = "default_key_file")]
    pub key_file: String,
}

fn default_key_file() -> String {
    "key.json".to_string()
}

impl Default for SignetConfig {
    fn default() -> Self {
        Self {
            token: TokenSection {
                name: "Signet".to_string(),
                symbol: "SGT".to_string(),
            },
            node: NodeSection {
                db_path: "./data/ledger".to_string(),
                log_level: "info".to_string(),
                key_file: "key.json".to_string(),
            },
        }
    }
}

impl SignetConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            println!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            config
        }
    }
}

use clap::Parser;
use tracing_subscriber::EnvFilter;

use signet::cli::{self, Cli, Commands};
use signet::config::SignetConfig;
use signet::error::SignetError;

fn main() {
    let cli = Cli::parse();
    let config = SignetConfig::load_or_default(&cli.config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.node.log_level.clone())),
        )
        .init();

    if let Err(e) = run(&cli, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &SignetConfig) -> Result<(), SignetError> {
    match &cli.command {
        Commands::Keygen { out } => cli::keys::handle_keygen(out),
        Commands::Init {
            initial_supply,
            decimals,
            key,
        } => cli::ops::handle_init(config, *initial_supply, *decimals, key),
        Commands::Info => cli::ops::handle_info(config),
        Commands::Balance { address } => cli::ops::handle_balance(config, address),
        Commands::Transfer {
            to,
            value,
            key,
            data,
        } => cli::tx::handle_transfer(config, to, *value, key, data),
        Commands::Sign {
            to,
            value,
            nonce,
            key,
            out,
        } => cli::tx::handle_sign(config, to, *value, *nonce, key, out),
        Commands::Remote { payload } => cli::tx::handle_remote(config, payload),
    }
}

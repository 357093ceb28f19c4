use clap::Parser;
use std::process;

use ink_wallet_watch::api::{Cli, CliHandler};
use ink_wallet_watch::config::AppConfig;
use ink_wallet_watch::store::open_store;

fn main() {
    dotenvy::dotenv().ok();

    // Less verbose than the watcher
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = match AppConfig::load_unvalidated() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };
    if let Some(path) = cli.store.clone() {
        config.store.path = path;
    }
    if let Some(backend) = cli.backend.clone() {
        config.store.backend = backend.to_lowercase();
    }

    let store = match open_store(&config.store) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open wallet store '{}': {}", config.store.path, e);
            process::exit(1);
        }
    };

    match CliHandler::new(store).execute_command(&cli.command) {
        Ok(reply) => println!("{}", reply),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

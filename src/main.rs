//! # Review Relay Main Entry Point

use review_relay::{config::ConfigLoader, server::run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    println!("Loaded configuration for profile: {}", config.profile);

    run(config).await?;
    Ok(())
}

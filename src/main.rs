//! # Caddie Main Entry Point
//!
//! This is the main entry point for the caddie scraping service.

use caddie::{config::ConfigLoader, service::run_service};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    // Log the loaded configuration (secrets redacted)
    println!("Loaded configuration for profile: {}", config.profile);
    if let Ok(redacted_json) = config.redacted_json() {
        println!("Configuration: {}", redacted_json);
    }

    // Start the scraping service with the loaded configuration
    run_service(config).await
}

//! Configuration command handlers for the sign-transfer CLI

use sign_transfer::{ClientConfig, ClientError, ClientResult};
use std::path::PathBuf;

use crate::ConfigCommands;

fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(secret) if secret.chars().count() > 4 => {
            format!("{}…", secret.chars().take(4).collect::<String>())
        }
        Some(_) => "****".to_string(),
        None => "(not set)".to_string(),
    }
}

pub fn handle_config_command(cmd: ConfigCommands, config: &ClientConfig) -> ClientResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("API:");
            println!("  Base URL: {}", config.api.api_base_url());
            println!(
                "  Integration key: {}",
                mask(config.api.integration_key.as_deref())
            );
            println!("  Timeout: {}ms", config.api.timeout_ms);
            println!("  Page size: {}", config.api.page_size);
            println!("Transfer:");
            println!(
                "  Sender: {}",
                config.transfer.sender.as_deref().unwrap_or("(integration default)")
            );
            println!(
                "  Receiver: {}",
                config
                    .transfer
                    .receiver
                    .as_deref()
                    .unwrap_or("(integration default)")
            );
            println!("  Continue on error: {}", config.transfer.continue_on_error);

            match config.validate() {
                Ok(()) => println!("✓ Configuration is valid"),
                Err(e) => println!("✗ {}", e),
            }
        }
        ConfigCommands::Init { path, force } => {
            let path = match path {
                Some(path) => PathBuf::from(path),
                None => ClientConfig::default_config_path()?,
            };

            if path.exists() && !force {
                return Err(ClientError::InvalidInput(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }

            ClientConfig::default().save_to_file(&path)?;
            println!("✓ Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

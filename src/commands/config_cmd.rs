use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;

use super::{CommandResult, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# storefront-admin configuration

# Base URL of the document store
# store_url: https://store.example.com/api

# API key sent with every request
# api_key: your-key

# Directory for local storage (default: platform data dir)
# data_dir: ~/.local/share/storefront-admin

# How collections are loaded: fetch or subscribe
sync_mode: fetch

# Country preselected for phone numbers
default_country: US
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!(
                            "store_url: {}",
                            config.store_url.value.as_deref().unwrap_or("(not set)")
                        );
                        println!("  source: {}", config.store_url.source);
                        println!();

                        let key = if config.api_key.value.is_some() {
                            "********"
                        } else {
                            "(not set)"
                        };
                        println!("api_key: {}", key);
                        println!("  source: {}", config.api_key.source);
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("sync_mode: {}", config.sync_mode.value);
                        println!("  source: {}", config.sync_mode.source);
                        println!();

                        println!("default_country: {}", config.default_country.value);
                        println!("  source: {}", config.default_country.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = Config::default_config_path();

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'storefront-admin config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

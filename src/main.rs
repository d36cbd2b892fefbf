use clap::{Parser, Subcommand};
use std::path::PathBuf;
use storefront_core::ItemKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    connect, CategoriesCommand, ConfigCommand, ContactsCommand, ItemsCommand, MigrateCommand,
    PrefsCommand, SettingsCommand, WatchCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "storefront-admin")]
#[command(version)]
#[command(about = "Manage a storefront's catalog, messages and settings", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products
    Products(ItemsCommand),

    /// Manage crafts
    Crafts(ItemsCommand),

    /// Manage product and craft categories
    Categories(CategoriesCommand),

    /// Review contact form messages
    Contacts(ContactsCommand),

    /// Manage WhatsApp numbers, contact info and business hours
    Settings(SettingsCommand),

    /// Move settings saved on this device into the store
    Migrate(MigrateCommand),

    /// Local preferences
    Prefs(PrefsCommand),

    /// Follow a collection live
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_admin=info,storefront_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Products(cmd)) => {
            cmd.run(ItemKind::Product, connect(&config)?, &config).await?;
        }
        Some(Commands::Crafts(cmd)) => {
            cmd.run(ItemKind::Craft, connect(&config)?, &config).await?;
        }
        Some(Commands::Categories(cmd)) => {
            cmd.run(connect(&config)?, &config).await?;
        }
        Some(Commands::Contacts(cmd)) => {
            cmd.run(connect(&config)?, &config).await?;
        }
        Some(Commands::Settings(cmd)) => {
            cmd.run(connect(&config)?).await?;
        }
        Some(Commands::Migrate(cmd)) => {
            cmd.run(connect(&config)?, &config).await?;
        }
        Some(Commands::Prefs(cmd)) => {
            cmd.run(&config)?;
        }
        Some(Commands::Watch(cmd)) => {
            cmd.run(connect(&config)?).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

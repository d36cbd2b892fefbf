use clap::Args;
use std::sync::Arc;
use storefront_core::{
    FileKv, Notification, Notifier, RemoteStore, SettingsMigration, SettingsStore, Severity,
};

use super::CommandResult;
use crate::config::Config;

/// Move settings saved on this device into the store
#[derive(Args)]
pub struct MigrateCommand {}

/// Prints notifications to the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => eprintln!("✗ {}", notification),
            Severity::Success => println!("✓ {}", notification),
            Severity::Info => println!("{}", notification),
        }
    }
}

impl MigrateCommand {
    pub async fn run(&self, store: Arc<dyn RemoteStore>, config: &Config) -> CommandResult {
        let kv = FileKv::new(config.data_dir.value.clone());
        let settings = SettingsStore::new(store);

        let report = SettingsMigration::new(&kv, &settings, &ConsoleNotifier)
            .run()
            .await?;

        if report.is_empty() {
            println!("No local settings to migrate ({})", kv.path().display());
        } else {
            for key in &report.migrated {
                println!("  migrated {}", key);
            }
        }
        Ok(())
    }
}

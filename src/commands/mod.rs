mod categories;
mod config_cmd;
mod contacts;
mod items;
mod migrate;
mod prefs;
mod settings;
mod watch;

use clap::ValueEnum;
use std::io::{self, Write};
use std::sync::Arc;
use storefront_core::{CollectionState, HttpStore, RemoteStore};

use crate::config::{Config, ConfigError};

pub use categories::CategoriesCommand;
pub use config_cmd::ConfigCommand;
pub use contacts::ContactsCommand;
pub use items::ItemsCommand;
pub use migrate::MigrateCommand;
pub use prefs::PrefsCommand;
pub use settings::SettingsCommand;
pub use watch::WatchCommand;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Builds the store client from the configured URL and key.
pub fn connect(config: &Config) -> Result<Arc<dyn RemoteStore>, ConfigError> {
    let url = config.require_store_url()?;
    tracing::debug!("Using store at {}", url);
    Ok(Arc::new(HttpStore::new(url, config.api_key.value.clone())))
}

/// Turns a failed initial load into an error.
fn loaded<T>(state: CollectionState<T>) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    match state.error {
        Some(error) => Err(error.into()),
        None => Ok(state.items),
    }
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Shortens `text` to `width` characters, marking the cut with "...".
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Lamp", 10), "Lamp");
        assert_eq!(truncate("A very long product name", 10), "A very ...");
        assert_eq!(truncate("مصباح نحاسي كبير", 8), "مصباح...");
    }

    #[test]
    fn test_loaded_surfaces_error() {
        let state = CollectionState::<u32> {
            items: vec![1],
            loading: false,
            error: Some("Failed to load products: offline".to_string()),
        };
        let err = loaded(state).unwrap_err();
        assert_eq!(err.to_string(), "Failed to load products: offline");
    }
}

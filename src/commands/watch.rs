use chrono::Local;
use clap::{Args, ValueEnum};
use std::sync::Arc;
use storefront_core::resources::{CATEGORIES, CONTACTS, CRAFTS, PRODUCTS};
use storefront_core::{
    Category, Collection, CollectionState, Contact, Entity, Item, RemoteStore, SyncMode,
};

use super::{CommandResult, OutputFormat};

#[derive(Clone, ValueEnum)]
pub enum WatchTarget {
    Products,
    Crafts,
    Categories,
    Contacts,
}

/// Follow a collection live and print every snapshot until Ctrl-C
#[derive(Args)]
pub struct WatchCommand {
    /// Collection to watch
    #[arg(value_enum)]
    target: WatchTarget,

    /// Output format (json prints one line per snapshot)
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl WatchCommand {
    pub async fn run(&self, store: Arc<dyn RemoteStore>) -> CommandResult {
        match self.target {
            WatchTarget::Products => {
                let items = Collection::activate(store, PRODUCTS, SyncMode::Subscribe);
                follow(items, &self.format, describe_item).await
            }
            WatchTarget::Crafts => {
                let items = Collection::activate(store, CRAFTS, SyncMode::Subscribe);
                follow(items, &self.format, describe_item).await
            }
            WatchTarget::Categories => {
                let categories = Collection::activate(store, CATEGORIES, SyncMode::Subscribe);
                follow(categories, &self.format, describe_category).await
            }
            WatchTarget::Contacts => {
                let contacts = Collection::activate(store, CONTACTS, SyncMode::Subscribe);
                follow(contacts, &self.format, describe_contact).await
            }
        }
    }
}

async fn follow<T: Entity>(
    collection: Collection<T>,
    format: &OutputFormat,
    describe: fn(&T) -> String,
) -> CommandResult {
    eprintln!("Watching {} (Ctrl-C to stop)", collection.name());
    let mut changes = collection.watch();

    loop {
        let state = changes.borrow_and_update().clone();
        if !state.loading {
            print_snapshot(&state, format, describe)?;
        }

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    collection.deactivate();
    Ok(())
}

fn print_snapshot<T: Entity>(
    state: &CollectionState<T>,
    format: &OutputFormat,
    describe: fn(&T) -> String,
) -> CommandResult {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&state.items)?);
        }
        OutputFormat::Text => {
            println!(
                "[{}] {} document(s)",
                Local::now().format("%H:%M:%S"),
                state.items.len()
            );
            for item in &state.items {
                println!("  {:<32}  {}", item.id(), describe(item));
            }
        }
    }
    if let Some(error) = &state.error {
        eprintln!("  ! {}", error);
    }
    Ok(())
}

fn describe_item(item: &Item) -> String {
    format!(
        "{}  {}",
        item.name,
        storefront_core::format::format_price(item.price_value, &item.price_currency)
    )
}

fn describe_category(category: &Category) -> String {
    format!("{} ({})", category.name, category.kind)
}

fn describe_contact(contact: &Contact) -> String {
    format!("{} <{}> [{}]", contact.name, contact.email, contact.status)
}

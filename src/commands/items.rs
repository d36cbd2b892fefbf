use clap::{Args, Subcommand};
use std::sync::Arc;
use storefront_core::{Item, ItemDraft, ItemKind, ItemPatch, Items, LocalizedText, RemoteStore};

use super::{confirm, loaded, truncate, CommandResult, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ItemsCommand {
    #[command(subcommand)]
    pub command: ItemsSubcommand,
}

#[derive(Subcommand)]
pub enum ItemsSubcommand {
    /// List items
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by category name
        #[arg(long)]
        category: Option<String>,
    },

    /// Show an item's details
    Show {
        /// Item ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a new item
    Add {
        /// English name
        name: String,

        /// Arabic name
        #[arg(long)]
        name_ar: Option<String>,

        /// Price value
        #[arg(long)]
        price: f64,

        /// Currency code (e.g. USD)
        #[arg(long, default_value = "USD")]
        currency: String,

        /// Category name
        #[arg(long)]
        category: String,

        /// English description
        #[arg(long)]
        description: Option<String>,

        /// Arabic description
        #[arg(long)]
        description_ar: Option<String>,

        /// Image URL
        #[arg(long)]
        image_url: Option<String>,

        /// Seller name
        #[arg(long)]
        seller: Option<String>,

        /// Rating from 0 to 5
        #[arg(long)]
        rating: Option<f64>,
    },

    /// Update an existing item
    Update {
        /// Item ID
        id: String,

        /// New English name
        #[arg(long)]
        name: Option<String>,

        /// New Arabic name
        #[arg(long)]
        name_ar: Option<String>,

        /// New price value
        #[arg(long)]
        price: Option<f64>,

        /// New currency code
        #[arg(long)]
        currency: Option<String>,

        /// New category name
        #[arg(long)]
        category: Option<String>,

        /// New image URL
        #[arg(long)]
        image_url: Option<String>,

        /// New seller name
        #[arg(long)]
        seller: Option<String>,

        /// New rating from 0 to 5
        #[arg(long)]
        rating: Option<f64>,
    },

    /// Delete an item
    Delete {
        /// Item ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ItemsCommand {
    pub async fn run(
        &self,
        kind: ItemKind,
        store: Arc<dyn RemoteStore>,
        config: &Config,
    ) -> CommandResult {
        let items = Items::activate(store, kind, config.sync_mode.value);
        let loaded_items = loaded(items.ready().await)?;

        match &self.command {
            ItemsSubcommand::List { format, category } => {
                let list = match category {
                    Some(category) => items.in_category(category),
                    None => loaded_items,
                };

                if list.is_empty() {
                    println!("No {}s found", kind);
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&list)?);
                    }
                    OutputFormat::Text => print_table(kind, &list),
                }
                Ok(())
            }

            ItemsSubcommand::Show { id, format } => {
                let item = items
                    .find(id)
                    .ok_or_else(|| format!("{} not found: {}", capitalize(kind), id))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&item)?),
                    OutputFormat::Text => println!("{}", item),
                }
                Ok(())
            }

            ItemsSubcommand::Add {
                name,
                name_ar,
                price,
                currency,
                category,
                description,
                description_ar,
                image_url,
                seller,
                rating,
            } => {
                let mut draft = ItemDraft::new(name, *price, currency, category);
                if let Some(name_ar) = name_ar {
                    draft = draft.with_arabic_name(name_ar);
                }
                if description.is_some() || description_ar.is_some() {
                    draft = draft.with_description(LocalizedText::new(
                        description.clone().unwrap_or_default(),
                        description_ar.clone().unwrap_or_default(),
                    ));
                }
                if let Some(url) = image_url {
                    draft = draft.with_image_url(url);
                }
                if let Some(seller) = seller {
                    draft = draft.with_seller(seller);
                }
                if let Some(rating) = rating {
                    draft = draft.with_rating(*rating);
                }

                let created = items.add(draft).await?;
                println!("Created {}:", kind);
                println!("{}", created);
                Ok(())
            }

            ItemsSubcommand::Update {
                id,
                name,
                name_ar,
                price,
                currency,
                category,
                image_url,
                seller,
                rating,
            } => {
                let existing = items
                    .find(id)
                    .ok_or_else(|| format!("{} not found: {}", capitalize(kind), id))?;

                let name = if name.is_some() || name_ar.is_some() {
                    Some(LocalizedText::new(
                        name.clone().unwrap_or(existing.name.en),
                        name_ar.clone().unwrap_or(existing.name.ar),
                    ))
                } else {
                    None
                };
                let patch = ItemPatch {
                    name,
                    price_value: *price,
                    price_currency: currency.clone(),
                    category: category.clone(),
                    image_url: image_url.clone(),
                    seller: seller.clone(),
                    rating: *rating,
                    ..ItemPatch::default()
                };

                if patch.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                items.update(id, patch).await?;
                if let Some(updated) = items.find(id) {
                    println!("Updated {}:", kind);
                    println!("{}", updated);
                }
                Ok(())
            }

            ItemsSubcommand::Delete { id, force } => {
                let item = items
                    .find(id)
                    .ok_or_else(|| format!("{} not found: {}", capitalize(kind), id))?;

                if !force && !confirm(&format!("Delete {} '{}'?", kind, item.name.en))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                items.delete(id).await?;
                println!("Deleted {}: {}", kind, item.name.en);
                Ok(())
            }
        }
    }
}

fn print_table(kind: ItemKind, items: &[Item]) {
    println!(
        "{:<32}  {:<30}  {:<14}  {:<16}  RATING",
        "ID", "NAME", "PRICE", "CATEGORY"
    );
    println!("{}", "-".repeat(104));
    for item in items {
        println!(
            "{:<32}  {:<30}  {:<14}  {:<16}  {}",
            item.id,
            truncate(&item.name.en, 30),
            storefront_core::format::format_price(item.price_value, &item.price_currency),
            truncate(&item.category, 16),
            storefront_core::format::format_rating(item.rating)
        );
    }
    println!("\nTotal: {} {}(s)", items.len(), kind);
}

fn capitalize(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Product => "Product",
        ItemKind::Craft => "Craft",
    }
}

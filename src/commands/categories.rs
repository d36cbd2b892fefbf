use clap::{Args, Subcommand};
use std::sync::Arc;
use storefront_core::{Categories, Category, CategoryKind, RemoteStore};

use super::{confirm, loaded, CommandResult, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct CategoriesCommand {
    #[command(subcommand)]
    pub command: CategoriesSubcommand,
}

#[derive(Subcommand)]
pub enum CategoriesSubcommand {
    /// List categories
    List {
        /// Only show categories of this type (products, crafts)
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<CategoryKind>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Category type (products, crafts)
        #[arg(long = "type", value_name = "TYPE", default_value = "products")]
        kind: CategoryKind,
    },

    /// Rename a category
    Rename {
        /// Category ID
        id: String,

        /// New name
        name: String,
    },

    /// Delete a category
    Delete {
        /// Category ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl CategoriesCommand {
    pub async fn run(&self, store: Arc<dyn RemoteStore>, config: &Config) -> CommandResult {
        let categories = Categories::activate(store, config.sync_mode.value);
        let all = loaded(categories.ready().await)?;

        match &self.command {
            CategoriesSubcommand::List { kind, format } => {
                let list: Vec<Category> = match kind {
                    Some(kind) => categories.of_kind(*kind),
                    None => all,
                };

                if list.is_empty() {
                    println!("No categories found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&list)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<32}  {:<10}  NAME", "ID", "TYPE");
                        println!("{}", "-".repeat(70));
                        for category in &list {
                            println!(
                                "{:<32}  {:<10}  {}",
                                category.id,
                                category.kind.to_string(),
                                category.name
                            );
                        }
                        println!("\nTotal: {} category(ies)", list.len());
                    }
                }
                Ok(())
            }

            CategoriesSubcommand::Add { name, kind } => {
                let created = categories.add(name, *kind).await?;
                println!("Created {} category: {} ({})", created.kind, created.name, created.id);
                Ok(())
            }

            CategoriesSubcommand::Rename { id, name } => {
                let existing = find(&categories, id)?;
                categories.rename(id, name).await?;
                println!("Renamed category '{}' to '{}'", existing.name, name.trim());
                Ok(())
            }

            CategoriesSubcommand::Delete { id, force } => {
                let existing = find(&categories, id)?;

                if !force && !confirm(&format!("Delete category '{}'?", existing.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                categories.delete(id).await?;
                println!("Deleted category: {}", existing.name);
                Ok(())
            }
        }
    }
}

fn find(categories: &Categories, id: &str) -> Result<Category, String> {
    categories
        .collection()
        .find(id)
        .ok_or_else(|| format!("Category not found: {}", id))
}

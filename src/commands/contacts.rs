use clap::{Args, Subcommand};
use std::sync::Arc;
use storefront_core::{Contact, ContactStatus, Contacts, RemoteStore};

use super::{confirm, loaded, truncate, CommandResult, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ContactsCommand {
    #[command(subcommand)]
    pub command: ContactsSubcommand,
}

#[derive(Subcommand)]
pub enum ContactsSubcommand {
    /// List contact messages
    List {
        /// Only show messages with this status (new, in-progress, resolved)
        #[arg(long)]
        status: Option<ContactStatus>,

        /// Only show messages that are not resolved, oldest first
        #[arg(long, conflicts_with = "status")]
        unresolved: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change a message's status
    Status {
        /// Contact ID
        id: String,

        /// New status (new, in-progress, resolved)
        status: ContactStatus,
    },

    /// Delete a contact message
    Delete {
        /// Contact ID
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ContactsCommand {
    pub async fn run(&self, store: Arc<dyn RemoteStore>, config: &Config) -> CommandResult {
        let contacts = Contacts::activate(store, config.sync_mode.value);
        let all = loaded(contacts.ready().await)?;

        match &self.command {
            ContactsSubcommand::List {
                status,
                unresolved,
                format,
            } => {
                let list = if *unresolved {
                    contacts.unresolved()
                } else if let Some(status) = status {
                    contacts.with_status(*status)
                } else {
                    all
                };

                if list.is_empty() {
                    println!("No messages found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&list)?);
                    }
                    OutputFormat::Text => print_messages(&list),
                }
                Ok(())
            }

            ContactsSubcommand::Status { id, status } => {
                let contact = find(&all, id)?;
                contacts.set_status(id, *status).await?;
                println!(
                    "Message from {} marked {} (was {})",
                    contact.name, status, contact.status
                );
                Ok(())
            }

            ContactsSubcommand::Delete { id, force } => {
                let contact = find(&all, id)?;

                if !force && !confirm(&format!("Delete message from '{}'?", contact.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                contacts.delete(id).await?;
                println!("Deleted message from: {}", contact.name);
                Ok(())
            }
        }
    }
}

fn find<'a>(contacts: &'a [Contact], id: &str) -> Result<&'a Contact, String> {
    contacts
        .iter()
        .find(|contact| contact.id == id)
        .ok_or_else(|| format!("Message not found: {}", id))
}

fn print_messages(contacts: &[Contact]) {
    println!(
        "{:<32}  {:<12}  {:<16}  {:<20}  {:<24}  MESSAGE",
        "ID", "STATUS", "RECEIVED", "NAME", "EMAIL"
    );
    println!("{}", "-".repeat(130));
    for contact in contacts {
        println!(
            "{:<32}  {:<12}  {:<16}  {:<20}  {:<24}  {}",
            contact.id,
            contact.status.to_string(),
            contact.created_at.format("%Y-%m-%d %H:%M").to_string(),
            truncate(&contact.name, 20),
            truncate(&contact.email, 24),
            truncate(contact.message.lines().next().unwrap_or_default(), 40)
        );
    }
    println!("\nTotal: {} message(s)", contacts.len());
}

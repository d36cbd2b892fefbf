use chrono::Weekday;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use storefront_core::format::{format_period, whatsapp_link};
use storefront_core::{
    BusinessHours, BusinessPeriod, ContactInfo, LocalizedText, RemoteStore, SettingsStore,
    WhatsAppNumber, WhatsAppSettings,
};

use super::{CommandResult, OutputFormat};

#[derive(Args)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub command: SettingsSubcommand,
}

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show WhatsApp numbers, contact info and business hours
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a WhatsApp number
    AddWhatsapp {
        /// Phone number in international format
        number: String,

        /// Label shown next to the number
        #[arg(long, default_value = "")]
        label: String,
    },

    /// Remove a WhatsApp number
    RemoveWhatsapp {
        /// Phone number as stored
        number: String,
    },

    /// Update contact info (unset options keep their current value)
    SetContact {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// English address
        #[arg(long)]
        address: Option<String>,

        /// Arabic address
        #[arg(long)]
        address_ar: Option<String>,
    },

    /// Replace business hours
    ///
    /// Each period is "DAY[-DAY] HH:MM-HH:MM" or "DAY[-DAY] closed",
    /// e.g. "Sun-Thu 09:00-17:00" "Fri closed".
    SetHours {
        #[arg(required = true, value_name = "PERIOD")]
        periods: Vec<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllSettings {
    whatsapp: WhatsAppSettings,
    contact: ContactInfo,
    business_hours: BusinessHours,
}

impl SettingsCommand {
    pub async fn run(&self, store: Arc<dyn RemoteStore>) -> CommandResult {
        let settings = SettingsStore::new(store);

        match &self.command {
            SettingsSubcommand::Show { format } => {
                let all = AllSettings {
                    whatsapp: settings.whatsapp().await?,
                    contact: settings.contact_info().await?,
                    business_hours: settings.business_hours().await?,
                };
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
                    OutputFormat::Text => print_settings(&all),
                }
                Ok(())
            }

            SettingsSubcommand::AddWhatsapp { number, label } => {
                let mut whatsapp = settings.whatsapp().await?;
                if whatsapp.numbers.iter().any(|n| n.number == number.trim()) {
                    return Err(format!("WhatsApp number already listed: {}", number).into());
                }
                whatsapp.numbers.push(WhatsAppNumber {
                    label: label.trim().to_string(),
                    number: number.trim().to_string(),
                });
                settings.save_whatsapp(&whatsapp).await?;
                println!("Added WhatsApp number: {}", number.trim());
                Ok(())
            }

            SettingsSubcommand::RemoveWhatsapp { number } => {
                let mut whatsapp = settings.whatsapp().await?;
                let before = whatsapp.numbers.len();
                whatsapp.numbers.retain(|n| n.number != number.trim());
                if whatsapp.numbers.len() == before {
                    return Err(format!("WhatsApp number not found: {}", number).into());
                }
                settings.save_whatsapp(&whatsapp).await?;
                println!("Removed WhatsApp number: {}", number.trim());
                Ok(())
            }

            SettingsSubcommand::SetContact {
                email,
                phone,
                address,
                address_ar,
            } => {
                if email.is_none() && phone.is_none() && address.is_none() && address_ar.is_none()
                {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let current = settings.contact_info().await?;
                let info = ContactInfo {
                    email: email.clone().unwrap_or(current.email),
                    phone: phone.clone().unwrap_or(current.phone),
                    address: LocalizedText::new(
                        address.clone().unwrap_or(current.address.en),
                        address_ar.clone().unwrap_or(current.address.ar),
                    ),
                };
                settings.save_contact_info(&info).await?;
                println!("Updated contact info");
                Ok(())
            }

            SettingsSubcommand::SetHours { periods } => {
                let hours = BusinessHours {
                    periods: periods
                        .iter()
                        .map(|p| parse_period(p))
                        .collect::<Result<_, _>>()?,
                };
                settings.save_business_hours(&hours).await?;
                println!("Saved {} business hour period(s)", hours.periods.len());
                Ok(())
            }
        }
    }
}

fn print_settings(all: &AllSettings) {
    println!("WhatsApp");
    println!("========");
    if all.whatsapp.numbers.is_empty() {
        println!("  (none)");
    }
    for entry in &all.whatsapp.numbers {
        let label = if entry.label.is_empty() {
            String::new()
        } else {
            format!("{}: ", entry.label)
        };
        println!("  {}{}  {}", label, entry.number, whatsapp_link(&entry.number));
    }
    println!();

    println!("Contact");
    println!("=======");
    println!("  Email:   {}", all.contact.email);
    println!("  Phone:   {}", all.contact.phone);
    println!("  Address: {}", all.contact.address);
    println!();

    println!("Business hours");
    println!("==============");
    if all.business_hours.periods.is_empty() {
        println!("  (none)");
    }
    for period in &all.business_hours.periods {
        println!("  {}", format_period(period));
    }
}

/// Parses "Sun-Thu 09:00-17:00" or "Fri closed".
fn parse_period(input: &str) -> Result<BusinessPeriod, String> {
    let invalid = || {
        format!(
            "Invalid period '{}'. Expected e.g. \"Sun-Thu 09:00-17:00\" or \"Fri closed\"",
            input
        )
    };

    let mut parts = input.split_whitespace();
    let (Some(days), Some(times), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let (from_day, to_day) = match days.split_once('-') {
        Some((from, to)) => (parse_day(from)?, parse_day(to)?),
        None => {
            let day = parse_day(days)?;
            (day, day)
        }
    };

    if times.eq_ignore_ascii_case("closed") {
        return Ok(BusinessPeriod::closed(from_day, to_day));
    }

    let (open, close) = times.split_once('-').ok_or_else(invalid)?;
    Ok(BusinessPeriod::open(from_day, to_day, open, close))
}

fn parse_day(day: &str) -> Result<Weekday, String> {
    day.parse()
        .map_err(|_| format!("Invalid day '{}'. Use e.g. Mon, Tue, ... Sun", day))
}

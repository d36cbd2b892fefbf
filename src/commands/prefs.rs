use clap::{Args, Subcommand};
use storefront_core::{FileKv, Language, Preferences};

use super::CommandResult;
use crate::config::Config;

#[derive(Args)]
pub struct PrefsCommand {
    #[command(subcommand)]
    pub command: PrefsSubcommand,
}

#[derive(Subcommand)]
pub enum PrefsSubcommand {
    /// Show or set the default country for phone numbers
    Country {
        /// Two-letter country code (e.g. SA)
        code: Option<String>,
    },

    /// Show or set the display language
    Language {
        /// Language (en, ar)
        language: Option<Language>,
    },
}

impl PrefsCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        let kv = FileKv::new(config.data_dir.value.clone());
        let prefs = Preferences::new(&kv, config.default_country.value.clone());

        match &self.command {
            PrefsSubcommand::Country { code: Some(code) } => {
                let code = prefs.set_country(code)?;
                println!("Preferred country set to {}", code);
            }
            PrefsSubcommand::Country { code: None } => {
                println!("{}", prefs.country()?);
            }
            PrefsSubcommand::Language {
                language: Some(language),
            } => {
                prefs.set_language(*language)?;
                println!("Preferred language set to {}", language);
            }
            PrefsSubcommand::Language { language: None } => {
                println!("{}", prefs.language()?);
            }
        }
        Ok(())
    }
}

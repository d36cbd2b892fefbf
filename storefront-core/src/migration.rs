//! One-time move of settings from local storage into the remote store.
//!
//! Older clients kept WhatsApp numbers, contact info and business hours in
//! local storage. [`SettingsMigration::run`] copies whichever of those keys
//! are present into their settings documents and then clears exactly those
//! keys. The first failure aborts the run and leaves every key in place, so a
//! later run starts over; settings writes are full overwrites and safe to
//! repeat.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::kv::{KeyValueStore, KvError};
use crate::models::{BusinessHours, BusinessPeriod, ContactInfo, WhatsAppNumber, WhatsAppSettings};
use crate::notify::{Notification, Notifier};
use crate::settings::{SettingsError, SettingsStore};

pub const LEGACY_WHATSAPP_KEY: &str = "whatsappNumbers";
pub const LEGACY_CONTACT_KEY: &str = "contactInfo";
pub const LEGACY_HOURS_KEY: &str = "businessHours";

/// Legacy keys in the order they are migrated.
pub const LEGACY_KEYS: [&str; 3] = [LEGACY_WHATSAPP_KEY, LEGACY_CONTACT_KEY, LEGACY_HOURS_KEY];

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Failed to read local settings: {0}")]
    Kv(#[from] KvError),

    #[error("Local value '{key}' is not valid: {source}")]
    Legacy {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to migrate '{key}': {source}")]
    Settings {
        key: &'static str,
        #[source]
        source: SettingsError,
    },
}

/// Keys that were copied to the remote store and removed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: Vec<&'static str>,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        self.migrated.is_empty()
    }
}

/// WhatsApp numbers were stored either as plain strings or labelled entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyWhatsApp {
    Entries(Vec<LegacyNumber>),
    Settings(WhatsAppSettings),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyNumber {
    Plain(String),
    Labelled(WhatsAppNumber),
}

impl From<LegacyWhatsApp> for WhatsAppSettings {
    fn from(legacy: LegacyWhatsApp) -> Self {
        match legacy {
            LegacyWhatsApp::Settings(settings) => settings,
            LegacyWhatsApp::Entries(entries) => WhatsAppSettings {
                numbers: entries
                    .into_iter()
                    .map(|entry| match entry {
                        LegacyNumber::Plain(number) => WhatsAppNumber {
                            label: String::new(),
                            number,
                        },
                        LegacyNumber::Labelled(number) => number,
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyHours {
    Periods(Vec<BusinessPeriod>),
    Hours(BusinessHours),
}

impl From<LegacyHours> for BusinessHours {
    fn from(legacy: LegacyHours) -> Self {
        match legacy {
            LegacyHours::Hours(hours) => hours,
            LegacyHours::Periods(periods) => BusinessHours { periods },
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    key: &'static str,
    value: Value,
) -> Result<T, MigrationError> {
    serde_json::from_value(value).map_err(|source| MigrationError::Legacy { key, source })
}

pub struct SettingsMigration<'a> {
    kv: &'a dyn KeyValueStore,
    settings: &'a SettingsStore,
    notifier: &'a dyn Notifier,
}

impl<'a> SettingsMigration<'a> {
    pub fn new(
        kv: &'a dyn KeyValueStore,
        settings: &'a SettingsStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            kv,
            settings,
            notifier,
        }
    }

    /// Migrates every present legacy key. Posts one notification when there
    /// was anything to migrate and none otherwise.
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        let mut present = Vec::new();
        for key in LEGACY_KEYS {
            if let Some(value) = self.kv.get(key)? {
                present.push((key, value));
            }
        }

        if present.is_empty() {
            tracing::debug!("No legacy settings to migrate");
            return Ok(MigrationReport::default());
        }

        match self.migrate(present).await {
            Ok(report) => {
                tracing::info!("Migrated legacy settings: {}", report.migrated.join(", "));
                self.notifier.notify(Notification::success(
                    "Settings migrated",
                    format!(
                        "Moved {} setting(s) from this device to the store",
                        report.migrated.len()
                    ),
                ));
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Settings migration failed: {}", e);
                self.notifier
                    .notify(Notification::error("Settings migration failed", e.to_string()));
                Err(e)
            }
        }
    }

    async fn migrate(
        &self,
        present: Vec<(&'static str, Value)>,
    ) -> Result<MigrationReport, MigrationError> {
        let mut migrated = Vec::with_capacity(present.len());

        for (key, value) in present {
            let written = match key {
                LEGACY_WHATSAPP_KEY => {
                    let settings: WhatsAppSettings = decode::<LegacyWhatsApp>(key, value)?.into();
                    self.settings.save_whatsapp(&settings).await
                }
                LEGACY_CONTACT_KEY => {
                    let info: ContactInfo = decode(key, value)?;
                    self.settings.save_contact_info(&info).await
                }
                _ => {
                    let hours: BusinessHours = decode::<LegacyHours>(key, value)?.into();
                    self.settings.save_business_hours(&hours).await
                }
            };
            written.map_err(|source| MigrationError::Settings { key, source })?;
            migrated.push(key);
        }

        for key in &migrated {
            self.kv.remove(key)?;
        }

        Ok(MigrationReport { migrated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::notify::{MemoryNotifier, Severity};
    use crate::settings::{BUSINESS_HOURS_PATH, CONTACT_PATH, WHATSAPP_PATH};
    use crate::store::{MemoryStore, Operation};
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        kv: MemoryKv,
        store: MemoryStore,
        settings: SettingsStore,
        notifier: MemoryNotifier,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new();
            Self {
                kv: MemoryKv::new(),
                settings: SettingsStore::new(Arc::new(store.clone())),
                store,
                notifier: MemoryNotifier::new(),
            }
        }

        fn with_all_keys() -> Self {
            let fixture = Self::new();
            fixture
                .kv
                .set(LEGACY_WHATSAPP_KEY, json!(["+966 50 000 0000"]))
                .unwrap();
            fixture
                .kv
                .set(
                    LEGACY_CONTACT_KEY,
                    json!({"email": "hello@example.com", "phone": "123", "address": "Riyadh"}),
                )
                .unwrap();
            fixture
                .kv
                .set(
                    LEGACY_HOURS_KEY,
                    json!([{"fromDay": "Sun", "toDay": "Thu", "open": "09:00", "close": "17:00"}]),
                )
                .unwrap();
            fixture
        }

        async fn run(&self) -> Result<MigrationReport, MigrationError> {
            SettingsMigration::new(&self.kv, &self.settings, &self.notifier)
                .run()
                .await
        }
    }

    #[tokio::test]
    async fn test_all_three_keys_migrated_and_removed() {
        let fixture = Fixture::with_all_keys();

        let report = fixture.run().await.unwrap();
        assert_eq!(report.migrated, LEGACY_KEYS.to_vec());
        assert_eq!(fixture.store.calls(Operation::SetDocument), 3);
        assert!(fixture.kv.is_empty());

        assert_eq!(
            fixture.store.document(WHATSAPP_PATH),
            Some(json!({"numbers": [{"label": "", "number": "+966 50 000 0000"}]}))
        );
        assert_eq!(
            fixture.store.document(CONTACT_PATH).unwrap()["address"],
            json!({"en": "Riyadh", "ar": ""})
        );
        assert!(fixture.store.document(BUSINESS_HOURS_PATH).is_some());

        let posted = fixture.notifier.notifications();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_no_keys_does_nothing() {
        let fixture = Fixture::new();
        fixture.kv.set("unrelated", json!(true)).unwrap();

        let report = fixture.run().await.unwrap();
        assert!(report.is_empty());
        assert_eq!(fixture.store.write_count(), 0);
        assert_eq!(fixture.kv.keys(), vec!["unrelated".to_string()]);
        assert!(fixture.notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_only_present_keys_are_removed() {
        let fixture = Fixture::new();
        fixture
            .kv
            .set(
                LEGACY_WHATSAPP_KEY,
                json!([{"label": "Sales", "number": "+15550100"}]),
            )
            .unwrap();
        fixture.kv.set("preferredCountry", json!("US")).unwrap();

        let report = fixture.run().await.unwrap();
        assert_eq!(report.migrated, vec![LEGACY_WHATSAPP_KEY]);
        assert_eq!(fixture.store.write_count(), 1);
        assert_eq!(fixture.kv.keys(), vec!["preferredCountry".to_string()]);
    }

    #[tokio::test]
    async fn test_write_failure_aborts_and_keeps_keys() {
        let fixture = Fixture::with_all_keys();
        fixture.store.fail(Operation::SetDocument);

        let err = fixture.run().await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Settings {
                key: LEGACY_WHATSAPP_KEY,
                ..
            }
        ));
        // Aborted after the first attempt
        assert_eq!(fixture.store.calls(Operation::SetDocument), 1);
        assert_eq!(fixture.kv.keys().len(), 3);

        let posted = fixture.notifier.notifications();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_invalid_legacy_value_aborts_later_writes() {
        let fixture = Fixture::with_all_keys();
        fixture.kv.set(LEGACY_CONTACT_KEY, json!(42)).unwrap();

        let err = fixture.run().await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Legacy {
                key: LEGACY_CONTACT_KEY,
                ..
            }
        ));
        // WhatsApp was written before the failure; nothing is rolled back
        assert_eq!(fixture.store.calls(Operation::SetDocument), 1);
        assert_eq!(fixture.kv.keys().len(), 3);
    }

    #[tokio::test]
    async fn test_rerun_after_success_is_noop() {
        let fixture = Fixture::with_all_keys();
        fixture.run().await.unwrap();
        let report = fixture.run().await.unwrap();

        assert!(report.is_empty());
        assert_eq!(fixture.store.calls(Operation::SetDocument), 3);
        assert_eq!(fixture.notifier.notifications().len(), 1);
    }
}

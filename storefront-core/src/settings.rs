//! Storefront-wide settings stored as singleton documents.
//!
//! Each document is overwritten as a whole on save. A document that has never
//! been written reads as its default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ValidationError;
use crate::models::{BusinessHours, ContactInfo, WhatsAppSettings};
use crate::store::{RemoteStore, StoreError};

pub const WHATSAPP_PATH: &str = "settings/whatsapp";
pub const CONTACT_PATH: &str = "settings/contact";
pub const BUSINESS_HOURS_PATH: &str = "settings/businessHours";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid settings document {path}: {source}")]
    Decode {
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn RemoteStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn whatsapp(&self) -> Result<WhatsAppSettings, SettingsError> {
        self.read(WHATSAPP_PATH).await
    }

    pub async fn save_whatsapp(&self, settings: &WhatsAppSettings) -> Result<(), SettingsError> {
        if settings.numbers.iter().any(|n| n.number.trim().is_empty()) {
            return Err(ValidationError::Empty("number").into());
        }
        self.write(WHATSAPP_PATH, settings).await
    }

    pub async fn contact_info(&self) -> Result<ContactInfo, SettingsError> {
        self.read(CONTACT_PATH).await
    }

    pub async fn save_contact_info(&self, info: &ContactInfo) -> Result<(), SettingsError> {
        self.write(CONTACT_PATH, info).await
    }

    pub async fn business_hours(&self) -> Result<BusinessHours, SettingsError> {
        self.read(BUSINESS_HOURS_PATH).await
    }

    pub async fn save_business_hours(&self, hours: &BusinessHours) -> Result<(), SettingsError> {
        hours.validate()?;
        self.write(BUSINESS_HOURS_PATH, hours).await
    }

    async fn read<T: DeserializeOwned + Default>(
        &self,
        path: &'static str,
    ) -> Result<T, SettingsError> {
        match self.store.get_document(path).await? {
            Some(value) => {
                serde_json::from_value(value).map_err(|source| SettingsError::Decode { path, source })
            }
            None => {
                tracing::debug!("{} not set, using defaults", path);
                Ok(T::default())
            }
        }
    }

    async fn write<T: Serialize>(&self, path: &'static str, value: &T) -> Result<(), SettingsError> {
        let value =
            serde_json::to_value(value).map_err(|source| SettingsError::Decode { path, source })?;
        if let Err(e) = self.store.set_document(path, value).await {
            tracing::error!("Failed to save {}: {}", path, e);
            return Err(e.into());
        }
        tracing::debug!("Saved {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BusinessPeriod, LocalizedText, WhatsAppNumber};
    use crate::store::{MemoryStore, Operation};
    use chrono::Weekday;
    use serde_json::json;

    fn settings_with(store: &MemoryStore) -> SettingsStore {
        SettingsStore::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_absent_documents_read_as_defaults() {
        let store = MemoryStore::new();
        let settings = settings_with(&store);

        assert_eq!(settings.whatsapp().await.unwrap(), WhatsAppSettings::default());
        assert_eq!(settings.contact_info().await.unwrap(), ContactInfo::default());
        assert!(settings.business_hours().await.unwrap().periods.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let store = MemoryStore::new();
        let settings = settings_with(&store);

        let info = ContactInfo {
            email: "hello@example.com".to_string(),
            phone: "+966500000000".to_string(),
            address: LocalizedText::new("Riyadh", "الرياض"),
        };
        settings.save_contact_info(&info).await.unwrap();

        assert_eq!(settings.contact_info().await.unwrap(), info);
        assert_eq!(
            store.document(CONTACT_PATH).unwrap()["address"],
            json!({"en": "Riyadh", "ar": "الرياض"})
        );
    }

    #[tokio::test]
    async fn test_invalid_hours_not_written() {
        let store = MemoryStore::new();
        let settings = settings_with(&store);
        let hours = BusinessHours {
            periods: vec![BusinessPeriod::open(Weekday::Mon, Weekday::Fri, "25:00", "17:00")],
        };

        let err = settings.save_business_hours(&hours).await.unwrap_err();
        assert!(matches!(err, SettingsError::Validation(_)));
        assert_eq!(store.calls(Operation::SetDocument), 0);
    }

    #[tokio::test]
    async fn test_blank_whatsapp_number_rejected() {
        let store = MemoryStore::new();
        let settings = settings_with(&store);
        let whatsapp = WhatsAppSettings {
            numbers: vec![WhatsAppNumber {
                label: "Sales".to_string(),
                number: " ".to_string(),
            }],
        };

        assert!(settings.save_whatsapp(&whatsapp).await.is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = MemoryStore::new();
        store.fail(Operation::GetDocument);

        let err = settings_with(&store).whatsapp().await.unwrap_err();
        assert!(matches!(err, SettingsError::Store(StoreError::Network(_))));
    }

    #[tokio::test]
    async fn test_malformed_document_is_decode_error() {
        let store = MemoryStore::new();
        store
            .set_document(WHATSAPP_PATH, json!({"numbers": "nope"}))
            .await
            .unwrap();

        let err = settings_with(&store).whatsapp().await.unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Decode {
                path: WHATSAPP_PATH,
                ..
            }
        ));
    }
}

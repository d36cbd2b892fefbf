//! Storefront Core Library
//!
//! Data access for the storefront admin: collection handles over a remote
//! document store, typed resources (products, crafts, categories, contacts),
//! singleton settings, the legacy settings migration and small local
//! preference/formatting helpers.

pub mod collection;
pub mod error;
pub mod format;
pub mod kv;
pub mod migration;
pub mod models;
pub mod notify;
pub mod preferences;
pub mod resources;
pub mod settings;
pub mod store;

pub use collection::{Collection, CollectionState, Entity, SyncMode};
pub use error::{CollectionError, ValidationError};
pub use kv::{FileKv, KeyValueStore, KvError, MemoryKv};
pub use migration::{MigrationError, MigrationReport, SettingsMigration};
pub use models::{
    BusinessHours, BusinessPeriod, Category, CategoryKind, Contact, ContactInfo, ContactStatus,
    Item, ItemDraft, ItemPatch, LocalizedText, SaveStatus, WhatsAppNumber, WhatsAppSettings,
};
pub use notify::{MemoryNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use preferences::{Language, PreferenceError, Preferences};
pub use resources::{Categories, ContactDraft, Contacts, ItemKind, Items};
pub use settings::{SettingsError, SettingsStore};
pub use store::{Fields, HttpStore, MemoryStore, Operation, RawDocument, RemoteStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

use chrono::Utc;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{CRAFTS, PRODUCTS};
use crate::collection::{Collection, CollectionState, SyncMode};
use crate::error::CollectionError;
use crate::models::{CategoryKind, Item, ItemDraft, ItemPatch};
use crate::store::RemoteStore;

/// Products and crafts share a shape but live in separate collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Product,
    Craft,
}

impl ItemKind {
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Product => PRODUCTS,
            ItemKind::Craft => CRAFTS,
        }
    }

    /// Categories that apply to this kind of item.
    pub fn category_kind(&self) -> CategoryKind {
        match self {
            ItemKind::Product => CategoryKind::Products,
            ItemKind::Craft => CategoryKind::Crafts,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Product => write!(f, "product"),
            ItemKind::Craft => write!(f, "craft"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product" | "products" => Ok(ItemKind::Product),
            "craft" | "crafts" => Ok(ItemKind::Craft),
            _ => Err(format!(
                "Invalid item kind '{}'. Valid options: products, crafts",
                s
            )),
        }
    }
}

pub struct Items {
    kind: ItemKind,
    collection: Collection<Item>,
}

impl Items {
    pub fn activate(store: Arc<dyn RemoteStore>, kind: ItemKind, mode: SyncMode) -> Self {
        Self {
            kind,
            collection: Collection::activate(store, kind.collection(), mode),
        }
    }

    pub fn products(store: Arc<dyn RemoteStore>, mode: SyncMode) -> Self {
        Self::activate(store, ItemKind::Product, mode)
    }

    pub fn crafts(store: Arc<dyn RemoteStore>, mode: SyncMode) -> Self {
        Self::activate(store, ItemKind::Craft, mode)
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn collection(&self) -> &Collection<Item> {
        &self.collection
    }

    pub async fn ready(&self) -> CollectionState<Item> {
        self.collection.ready().await
    }

    /// Validates the draft, fills defaults and timestamps, then stores it.
    pub async fn add(&self, draft: ItemDraft) -> Result<Item, CollectionError> {
        let item = Item::from_draft(draft, Utc::now())?.saving();
        tracing::debug!("Saving {} '{}'", self.kind, item.name.en);
        self.collection.add(&item).await
    }

    /// Applies a partial update and stamps `updatedAt`.
    pub async fn update(&self, id: &str, patch: ItemPatch) -> Result<(), CollectionError> {
        patch.validate()?;
        let patch = patch.touched(Utc::now());
        self.collection.update(id, &patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), CollectionError> {
        self.collection.delete(id).await
    }

    pub async fn refetch(&self) -> Result<(), CollectionError> {
        self.collection.refetch().await
    }

    pub fn items(&self) -> Vec<Item> {
        self.collection.items()
    }

    pub fn find(&self, id: &str) -> Option<Item> {
        self.collection.find(id)
    }

    /// Items filed under `category`, matched case-insensitively.
    pub fn in_category(&self, category: &str) -> Vec<Item> {
        let category = category.trim().to_lowercase();
        self.items()
            .into_iter()
            .filter(|item| item.category.trim().to_lowercase() == category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::SaveStatus;
    use crate::store::{MemoryStore, Operation, StoreError};
    use serde_json::json;

    async fn products(store: &MemoryStore) -> Items {
        let items = Items::products(Arc::new(store.clone()), SyncMode::FetchOnce);
        items.ready().await;
        items
    }

    #[tokio::test]
    async fn test_add_widget_to_empty_products() {
        let store = MemoryStore::new();
        let items = products(&store).await;

        let added = items
            .add(ItemDraft::new("Widget", 10.0, "USD", "Tools"))
            .await
            .unwrap();

        assert!(!added.id.is_empty());
        assert_eq!(added.status, SaveStatus::Saved);

        let list = items.items();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name.en, "Widget");
        assert_eq!(list[0].price_value, 10.0);
        assert_eq!(list[0].category, "Tools");

        let stored = &store.documents(PRODUCTS)[0];
        assert_eq!(stored.fields["name"], json!({"en": "Widget", "ar": ""}));
        assert!(stored.fields.contains_key("createdAt"));
        assert!(!stored.fields.contains_key("status"));
        assert!(!stored.fields.contains_key("id"));
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_store() {
        let store = MemoryStore::new();
        let items = products(&store).await;

        let err = items
            .add(ItemDraft::new("Widget", f64::NAN, "USD", "Tools"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectionError::Validation(ValidationError::InvalidPrice(_))
        ));
        assert_eq!(store.calls(Operation::Add), 0);
        assert_eq!(items.collection().error(), None);
    }

    #[tokio::test]
    async fn test_update_merges_and_stamps_updated_at() {
        let store = MemoryStore::new();
        let items = products(&store).await;
        let added = items
            .add(ItemDraft::new("Widget", 10.0, "USD", "Tools").with_seller("Acme"))
            .await
            .unwrap();

        items
            .update(
                &added.id,
                ItemPatch {
                    price_value: Some(12.5),
                    ..ItemPatch::default()
                },
            )
            .await
            .unwrap();

        let updated = items.find(&added.id).unwrap();
        assert_eq!(updated.price_value, 12.5);
        assert_eq!(updated.seller, "Acme");
        assert_eq!(updated.name, added.name);
        assert!(updated.updated_at >= added.updated_at);
        assert_eq!(updated.created_at, added.created_at);
    }

    #[tokio::test]
    async fn test_update_failure_leaves_list_unchanged() {
        let store = MemoryStore::new();
        let items = products(&store).await;
        let added = items
            .add(ItemDraft::new("Widget", 10.0, "USD", "Tools"))
            .await
            .unwrap();
        let before = items.items();

        store.fail(Operation::Update);
        let err = items
            .update(
                &added.id,
                ItemPatch {
                    price_value: Some(99.0),
                    ..ItemPatch::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CollectionError::Store(StoreError::Network(_))));
        assert_eq!(items.items(), before);
        assert!(!items.collection().error().unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_category_filter() {
        let store = MemoryStore::new();
        let items = Items::crafts(Arc::new(store.clone()), SyncMode::FetchOnce);
        items.ready().await;

        let bowl = items
            .add(ItemDraft::new("Bowl", 30.0, "SAR", "Pottery"))
            .await
            .unwrap();
        items
            .add(ItemDraft::new("Rug", 120.0, "SAR", "Weaving"))
            .await
            .unwrap();

        assert_eq!(items.in_category(" pottery ").len(), 1);

        items.delete(&bowl.id).await.unwrap();
        assert!(items.find(&bowl.id).is_none());
        assert!(items.in_category("Pottery").is_empty());
        assert_eq!(store.documents(CRAFTS).len(), 1);
    }

    #[tokio::test]
    async fn test_refetch_normalizes_loose_documents() {
        let store = MemoryStore::new();
        store.seed(
            PRODUCTS,
            vec![json!({"name": "Lamp", "priceValue": "15", "priceCurrency": "usd", "rating": "4"})
                .as_object()
                .cloned()
                .unwrap()],
        );
        let items = products(&store).await;

        let lamp = &items.items()[0];
        assert_eq!(lamp.price_value, 15.0);
        assert_eq!(lamp.rating, 4.0);

        items.refetch().await.unwrap();
        assert_eq!(items.items().len(), 1);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ItemKind::Craft.collection(), "crafts");
        assert_eq!(ItemKind::Product.category_kind(), CategoryKind::Products);
        assert_eq!("Crafts".parse::<ItemKind>().unwrap(), ItemKind::Craft);
        assert!("services".parse::<ItemKind>().is_err());
    }
}

use serde::Serialize;
use std::sync::Arc;

use super::CATEGORIES;
use crate::collection::{Collection, CollectionState, SyncMode};
use crate::error::{CollectionError, ValidationError};
use crate::models::{Category, CategoryKind};
use crate::store::RemoteStore;

#[derive(Serialize)]
struct NewCategory<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: CategoryKind,
}

#[derive(Serialize)]
struct Rename<'a> {
    name: &'a str,
}

/// Category names are unique per kind, checked against the loaded set only.
/// Concurrent writers can still create duplicates.
pub struct Categories {
    collection: Collection<Category>,
}

impl Categories {
    pub fn activate(store: Arc<dyn RemoteStore>, mode: SyncMode) -> Self {
        Self {
            collection: Collection::activate(store, CATEGORIES, mode),
        }
    }

    pub fn collection(&self) -> &Collection<Category> {
        &self.collection
    }

    pub async fn ready(&self) -> CollectionState<Category> {
        self.collection.ready().await
    }

    pub async fn add(&self, name: &str, kind: CategoryKind) -> Result<Category, CollectionError> {
        let name = self.check_name(name, Some(kind), None)?;
        self.collection.add(&NewCategory { name, kind }).await
    }

    /// Renames within the category's own kind. An id that is not cached
    /// has no known kind, so only the blank check applies.
    pub async fn rename(&self, id: &str, name: &str) -> Result<(), CollectionError> {
        let kind = self.collection.find(id).map(|category| category.kind);
        let name = self.check_name(name, kind, Some(id))?;
        self.collection.update(id, &Rename { name }).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), CollectionError> {
        self.collection.delete(id).await
    }

    pub async fn refetch(&self) -> Result<(), CollectionError> {
        self.collection.refetch().await
    }

    pub fn items(&self) -> Vec<Category> {
        self.collection.items()
    }

    pub fn of_kind(&self, kind: CategoryKind) -> Vec<Category> {
        self.items()
            .into_iter()
            .filter(|category| category.kind == kind)
            .collect()
    }

    pub fn names(&self, kind: CategoryKind) -> Vec<String> {
        self.of_kind(kind)
            .into_iter()
            .map(|category| category.name)
            .collect()
    }

    /// Returns the trimmed name if it is non-blank and unused for `kind`.
    fn check_name<'n>(
        &self,
        name: &'n str,
        kind: Option<CategoryKind>,
        except: Option<&str>,
    ) -> Result<&'n str, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        let Some(kind) = kind else {
            return Ok(name);
        };

        let taken = self.of_kind(kind).iter().any(|category| {
            Some(category.id.as_str()) != except && category.has_name(name)
        });
        if taken {
            return Err(ValidationError::DuplicateCategory {
                name: name.to_string(),
                kind,
            });
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Operation};
    use serde_json::json;

    async fn categories(store: &MemoryStore) -> Categories {
        let categories = Categories::activate(Arc::new(store.clone()), SyncMode::FetchOnce);
        categories.ready().await;
        categories
    }

    #[tokio::test]
    async fn test_add_stores_type_field() {
        let store = MemoryStore::new();
        let categories = categories(&store).await;

        let added = categories.add("  Pottery ", CategoryKind::Crafts).await.unwrap();
        assert_eq!(added.name, "Pottery");
        assert_eq!(added.kind, CategoryKind::Crafts);
        assert_eq!(store.documents(CATEGORIES)[0].fields["type"], json!("crafts"));
    }

    #[tokio::test]
    async fn test_duplicate_rejected_without_remote_call() {
        let store = MemoryStore::new();
        let categories = categories(&store).await;
        categories.add("Pottery", CategoryKind::Crafts).await.unwrap();
        let adds = store.calls(Operation::Add);

        let err = categories
            .add("pottery", CategoryKind::Crafts)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectionError::Validation(ValidationError::DuplicateCategory { .. })
        ));
        assert_eq!(store.calls(Operation::Add), adds);
        assert_eq!(categories.items().len(), 1);
        assert_eq!(categories.collection().error(), None);
    }

    #[tokio::test]
    async fn test_same_name_allowed_for_other_kind() {
        let store = MemoryStore::new();
        let categories = categories(&store).await;
        categories.add("Gifts", CategoryKind::Products).await.unwrap();
        categories.add("Gifts", CategoryKind::Crafts).await.unwrap();

        assert_eq!(categories.names(CategoryKind::Products), vec!["Gifts"]);
        assert_eq!(categories.names(CategoryKind::Crafts), vec!["Gifts"]);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let store = MemoryStore::new();
        let categories = categories(&store).await;

        let err = categories.add("   ", CategoryKind::Products).await.unwrap_err();
        assert!(matches!(
            err,
            CollectionError::Validation(ValidationError::Empty("name"))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_rename_guards_duplicates_but_allows_own_name() {
        let store = MemoryStore::new();
        let categories = categories(&store).await;
        let tools = categories.add("Tools", CategoryKind::Products).await.unwrap();
        categories.add("Garden", CategoryKind::Products).await.unwrap();

        let err = categories.rename(&tools.id, "garden").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.calls(Operation::Update), 0);

        categories.rename(&tools.id, "TOOLS").await.unwrap();
        categories.rename(&tools.id, "Hardware").await.unwrap();
        assert_eq!(
            categories.names(CategoryKind::Products),
            vec!["Hardware", "Garden"]
        );
        // Renaming keeps the kind
        assert_eq!(store.documents(CATEGORIES)[0].fields["type"], json!("products"));
    }

    #[tokio::test]
    async fn test_rename_of_uncached_category_skips_duplicate_guard() {
        let store = MemoryStore::new();
        let categories = categories(&store).await;
        categories.add("Pottery", CategoryKind::Products).await.unwrap();

        // A crafts category this handle has not loaded yet.
        let ids = store.seed(
            CATEGORIES,
            vec![json!({"name": "Kiln", "type": "crafts"})
                .as_object()
                .cloned()
                .unwrap()],
        );
        categories.rename(&ids[0], "Pottery").await.unwrap();

        let renamed = store
            .documents(CATEGORIES)
            .into_iter()
            .find(|doc| doc.id == ids[0])
            .unwrap();
        assert_eq!(renamed.fields["name"], json!("Pottery"));
        assert_eq!(renamed.fields["type"], json!("crafts"));

        let err = categories.rename(&ids[0], "  ").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_delete_and_of_kind() {
        let store = MemoryStore::new();
        let categories = categories(&store).await;
        let tools = categories.add("Tools", CategoryKind::Products).await.unwrap();
        categories.add("Pottery", CategoryKind::Crafts).await.unwrap();

        categories.delete(&tools.id).await.unwrap();
        assert!(categories.of_kind(CategoryKind::Products).is_empty());
        assert_eq!(categories.of_kind(CategoryKind::Crafts).len(), 1);
    }
}

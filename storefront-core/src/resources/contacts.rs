use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::CONTACTS;
use crate::collection::{Collection, CollectionState, SyncMode};
use crate::error::{CollectionError, ValidationError};
use crate::models::{Contact, ContactStatus};
use crate::store::RemoteStore;

/// A message submitted through the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactDraft {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::Empty("email"));
        }
        if !self.email.contains('@') {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::Empty("message"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewContact<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    status: ContactStatus,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct StatusChange {
    status: ContactStatus,
}

pub struct Contacts {
    collection: Collection<Contact>,
}

impl Contacts {
    pub fn activate(store: Arc<dyn RemoteStore>, mode: SyncMode) -> Self {
        Self {
            collection: Collection::activate(store, CONTACTS, mode),
        }
    }

    pub fn collection(&self) -> &Collection<Contact> {
        &self.collection
    }

    pub async fn ready(&self) -> CollectionState<Contact> {
        self.collection.ready().await
    }

    /// Stores a new message with status `new`.
    pub async fn submit(&self, draft: ContactDraft) -> Result<Contact, CollectionError> {
        draft.validate()?;
        let contact = NewContact {
            name: draft.name.trim(),
            email: draft.email.trim(),
            message: draft.message.trim(),
            status: ContactStatus::New,
            created_at: Utc::now(),
        };
        self.collection.add(&contact).await
    }

    pub async fn set_status(&self, id: &str, status: ContactStatus) -> Result<(), CollectionError> {
        self.collection.update(id, &StatusChange { status }).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), CollectionError> {
        self.collection.delete(id).await
    }

    pub async fn refetch(&self) -> Result<(), CollectionError> {
        self.collection.refetch().await
    }

    pub fn items(&self) -> Vec<Contact> {
        self.collection.items()
    }

    pub fn with_status(&self, status: ContactStatus) -> Vec<Contact> {
        self.items()
            .into_iter()
            .filter(|contact| contact.status == status)
            .collect()
    }

    /// Messages not yet resolved, oldest first.
    pub fn unresolved(&self) -> Vec<Contact> {
        let mut open: Vec<Contact> = self
            .items()
            .into_iter()
            .filter(|contact| contact.status != ContactStatus::Resolved)
            .collect();
        open.sort_by_key(|contact| contact.created_at);
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Operation};
    use serde_json::json;

    async fn contacts(store: &MemoryStore) -> Contacts {
        let contacts = Contacts::activate(Arc::new(store.clone()), SyncMode::FetchOnce);
        contacts.ready().await;
        contacts
    }

    fn draft() -> ContactDraft {
        ContactDraft::new("Sara", "sara@example.com", "Do you ship abroad?")
    }

    #[tokio::test]
    async fn test_submit_forces_new_status() {
        let store = MemoryStore::new();
        let contacts = contacts(&store).await;

        let contact = contacts.submit(draft()).await.unwrap();
        assert_eq!(contact.status, ContactStatus::New);
        assert_eq!(contacts.items(), vec![contact]);

        let stored = &store.documents(CONTACTS)[0];
        assert_eq!(stored.fields["status"], json!("new"));
        assert!(stored.fields.contains_key("createdAt"));
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let store = MemoryStore::new();
        let contacts = contacts(&store).await;

        let err = contacts
            .submit(ContactDraft::new("Sara", "not-an-email", "Hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CollectionError::Validation(ValidationError::InvalidEmail(_))
        ));

        let err = contacts
            .submit(ContactDraft::new("Sara", "sara@example.com", "  "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CollectionError::Validation(ValidationError::Empty("message"))
        ));
        assert_eq!(store.calls(Operation::Add), 0);
    }

    #[tokio::test]
    async fn test_status_transitions_in_any_order() {
        let store = MemoryStore::new();
        let contacts = contacts(&store).await;
        let contact = contacts.submit(draft()).await.unwrap();

        contacts
            .set_status(&contact.id, ContactStatus::Resolved)
            .await
            .unwrap();
        assert_eq!(contacts.with_status(ContactStatus::Resolved).len(), 1);
        assert!(contacts.unresolved().is_empty());

        contacts
            .set_status(&contact.id, ContactStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(contacts.unresolved().len(), 1);
        assert_eq!(
            store.documents(CONTACTS)[0].fields["status"],
            json!("in-progress")
        );
    }

    #[tokio::test]
    async fn test_unresolved_sorted_oldest_first() {
        let store = MemoryStore::new();
        store.seed(
            CONTACTS,
            vec![
                json!({"name": "B", "email": "b@x.io", "message": "2", "createdAt": "2024-02-01T00:00:00Z"}),
                json!({"name": "A", "email": "a@x.io", "message": "1", "createdAt": "2024-01-01T00:00:00Z"}),
                json!({"name": "C", "email": "c@x.io", "message": "3", "status": "resolved"}),
            ]
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect(),
        );
        let contacts = contacts(&store).await;

        let names: Vec<String> = contacts.unresolved().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let contacts = contacts(&store).await;
        let contact = contacts.submit(draft()).await.unwrap();

        contacts.delete(&contact.id).await.unwrap();
        assert!(contacts.items().is_empty());
        assert!(store.documents(CONTACTS).is_empty());
    }
}

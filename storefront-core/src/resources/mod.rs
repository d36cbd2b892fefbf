//! Typed handles over the storefront collections.
//!
//! Each handle wraps a [`crate::Collection`] bound to a fixed collection name
//! and adds the defaulting and validation for its entity.

mod categories;
mod contacts;
mod items;

pub use categories::Categories;
pub use contacts::{ContactDraft, Contacts};
pub use items::{ItemKind, Items};

pub const PRODUCTS: &str = "products";
pub const CRAFTS: &str = "crafts";
pub const CATEGORIES: &str = "categories";
pub const CONTACTS: &str = "contacts";

mod category;
mod contact;
mod item;
mod lenient;
mod settings;
mod text;

pub use category::{Category, CategoryKind};
pub use contact::{Contact, ContactStatus};
pub use item::{Item, ItemDraft, ItemPatch, SaveStatus};
pub use settings::{BusinessHours, BusinessPeriod, ContactInfo, WhatsAppNumber, WhatsAppSettings};
pub use text::LocalizedText;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::lenient;
use super::text::LocalizedText;
use crate::error::ValidationError;

/// Where an entity stands relative to the remote store.
///
/// Only tracked locally; never written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Unsaved,
    Saving,
    Saved,
}

impl SaveStatus {
    pub fn saved() -> Self {
        SaveStatus::Saved
    }
}

/// A product or craft listed in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price_value: f64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub price_currency: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub image_url: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub seller: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rating: f64,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip, default = "SaveStatus::saved")]
    pub status: SaveStatus,
}

impl Item {
    /// Builds an unsaved item from a draft, filling defaults.
    pub fn from_draft(draft: ItemDraft, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        draft.validate()?;

        let created_at = draft.created_at.unwrap_or(now);
        Ok(Self {
            id: String::new(),
            name: LocalizedText::new(draft.name.en.trim(), draft.name.ar.trim()),
            description: draft.description.unwrap_or_default(),
            price_value: draft.price_value,
            price_currency: draft.price_currency.trim().to_uppercase(),
            category: draft.category.trim().to_string(),
            image_url: draft.image_url.unwrap_or_default(),
            seller: draft.seller.unwrap_or_default(),
            rating: draft.rating.unwrap_or(0.0),
            created_at,
            updated_at: draft.updated_at.unwrap_or(created_at),
            status: SaveStatus::Unsaved,
        })
    }

    /// Marks the item as handed to the store and awaiting confirmation.
    pub fn saving(mut self) -> Self {
        self.status = SaveStatus::Saving;
        self
    }

    /// True once the store has assigned an identifier.
    pub fn is_persisted(&self) -> bool {
        self.status == SaveStatus::Saved && !self.id.is_empty()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.en.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(
            f,
            "Price: {}",
            crate::format::format_price(self.price_value, &self.price_currency)
        )?;
        if !self.category.is_empty() {
            writeln!(f, "Category: {}", self.category)?;
        }
        if !self.seller.is_empty() {
            writeln!(f, "Seller: {}", self.seller)?;
        }
        writeln!(f, "Rating: {}", crate::format::format_rating(self.rating))?;
        if !self.description.is_blank() {
            writeln!(f, "\n{}", self.description)?;
        }
        Ok(())
    }
}

/// Fields submitted when creating a product or craft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub price_value: f64,
    pub price_currency: String,
    pub category: String,
    pub image_url: Option<String>,
    pub seller: Option<String>,
    pub rating: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ItemDraft {
    pub fn new(
        name: impl Into<String>,
        price_value: f64,
        price_currency: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: LocalizedText::english(name),
            price_value,
            price_currency: price_currency.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn with_arabic_name(mut self, name: impl Into<String>) -> Self {
        self.name.ar = name.into();
        self
    }

    pub fn with_description(mut self, description: LocalizedText) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_seller(mut self, seller: impl Into<String>) -> Self {
        self.seller = Some(seller.into());
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.en.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if self.price_currency.trim().is_empty() {
            return Err(ValidationError::Empty("currency"));
        }
        validate_price(self.price_value)?;
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }
}

/// A partial update to a product or craft. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.en.trim().is_empty() {
                return Err(ValidationError::Empty("name"));
            }
        }
        if let Some(currency) = &self.price_currency {
            if currency.trim().is_empty() {
                return Err(ValidationError::Empty("currency"));
            }
        }
        if let Some(price) = self.price_value {
            validate_price(price)?;
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stamps `updatedAt` unless the caller already set it.
    pub fn touched(mut self, now: DateTime<Utc>) -> Self {
        if self.updated_at.is_none() {
            self.updated_at = Some(now);
        }
        if let Some(currency) = self.price_currency.as_mut() {
            *currency = currency.trim().to_uppercase();
        }
        self
    }
}

fn validate_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidPrice(price));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> Result<(), ValidationError> {
    if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
        return Err(ValidationError::InvalidRating(rating));
    }
    Ok(())
}

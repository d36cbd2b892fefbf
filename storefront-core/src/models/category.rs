use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which catalog a category belongs to. Names are unique per kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    #[default]
    Products,
    Crafts,
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKind::Products => write!(f, "products"),
            CategoryKind::Crafts => write!(f, "crafts"),
        }
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product" | "products" => Ok(CategoryKind::Products),
            "craft" | "crafts" => Ok(CategoryKind::Crafts),
            _ => Err(format!(
                "Invalid category type '{}'. Valid options: products, crafts",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CategoryKind,
}

impl Category {
    /// Case-insensitive comparison after trimming.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

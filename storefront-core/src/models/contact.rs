use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::lenient;

/// Lifecycle of a contact message. Any transition is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactStatus {
    #[default]
    New,
    InProgress,
    Resolved,
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactStatus::New => write!(f, "new"),
            ContactStatus::InProgress => write!(f, "in-progress"),
            ContactStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "new" => Ok(ContactStatus::New),
            "in-progress" => Ok(ContactStatus::InProgress),
            "resolved" => Ok(ContactStatus::Resolved),
            _ => Err(format!(
                "Invalid status '{}'. Valid options: new, in-progress, resolved",
                s
            )),
        }
    }
}

/// A message left through the storefront contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub message: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_display_and_parse() {
        assert_eq!(ContactStatus::InProgress.to_string(), "in-progress");
        assert_eq!(
            ContactStatus::from_str("IN_PROGRESS").unwrap(),
            ContactStatus::InProgress
        );
        assert!(ContactStatus::from_str("closed").is_err());
    }

    #[test]
    fn test_status_json_uses_kebab_case() {
        let json = serde_json::to_string(&ContactStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_decode_contact_defaults_status() {
        let contact: Contact = serde_json::from_value(json!({
            "id": "m1",
            "name": "Sara",
            "email": "sara@example.com",
            "message": "Do you ship abroad?",
            "createdAt": "2024-03-01T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(contact.status, ContactStatus::New);
        assert_eq!(contact.created_at.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }
}

//! Deserializers that normalize loosely typed store fields.
//!
//! Documents written by older admin builds stored prices as strings and left
//! optional fields as `null`; these helpers read both shapes.

use chrono::{DateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberRepr {
    Number(f64),
    Text(String),
    Null(()),
}

/// Reads a number, a numeric string, or null (as `0`).
pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberRepr::deserialize(deserializer)? {
        NumberRepr::Number(n) => Ok(n),
        NumberRepr::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid number '{}'", s)))
        }
        NumberRepr::Null(()) => Ok(0.0),
    }
}

/// Reads a string, treating null as blank.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads an RFC 3339 timestamp, treating null as the epoch.
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DateTime<Utc>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "number")]
        price: f64,
        #[serde(default, deserialize_with = "string")]
        seller: String,
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        let sample: Sample = serde_json::from_value(json!({"price": " 12.5 "})).unwrap();
        assert_eq!(sample.price, 12.5);
    }

    #[test]
    fn test_number_accepts_integers_and_null() {
        let sample: Sample = serde_json::from_value(json!({"price": 10})).unwrap();
        assert_eq!(sample.price, 10.0);

        let sample: Sample = serde_json::from_value(json!({"price": null})).unwrap();
        assert_eq!(sample.price, 0.0);
    }

    #[test]
    fn test_number_rejects_garbage() {
        let result: Result<Sample, _> = serde_json::from_value(json!({"price": "ten"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_string_null_is_blank() {
        let sample: Sample = serde_json::from_value(json!({"seller": null})).unwrap();
        assert_eq!(sample.seller, "");
    }
}

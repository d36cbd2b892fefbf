//! Singleton settings documents.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::lenient;
use super::text::LocalizedText;
use crate::error::ValidationError;

const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsAppNumber {
    #[serde(default, deserialize_with = "lenient::string")]
    pub label: String,
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsAppSettings {
    #[serde(default)]
    pub numbers: Vec<WhatsAppNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(default)]
    pub address: LocalizedText,
}

/// Opening hours for a run of days, e.g. Sunday through Thursday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPeriod {
    pub from_day: Weekday,
    pub to_day: Weekday,
    #[serde(default, deserialize_with = "lenient::string")]
    pub open: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub close: String,
    #[serde(default)]
    pub closed: bool,
}

impl BusinessPeriod {
    pub fn open(from_day: Weekday, to_day: Weekday, open: &str, close: &str) -> Self {
        Self {
            from_day,
            to_day,
            open: open.to_string(),
            close: close.to_string(),
            closed: false,
        }
    }

    pub fn closed(from_day: Weekday, to_day: Weekday) -> Self {
        Self {
            from_day,
            to_day,
            open: String::new(),
            close: String::new(),
            closed: true,
        }
    }

    /// True if `day` falls in the range. Ranges may wrap past Sunday.
    pub fn covers(&self, day: Weekday) -> bool {
        let from = self.from_day.num_days_from_monday();
        let to = self.to_day.num_days_from_monday();
        let day = day.num_days_from_monday();
        if from <= to {
            from <= day && day <= to
        } else {
            day >= from || day <= to
        }
    }

    /// Parsed opening and closing times; `None` for closed periods.
    pub fn times(&self) -> Result<Option<(NaiveTime, NaiveTime)>, ValidationError> {
        if self.closed {
            return Ok(None);
        }
        let open = parse_time(&self.open)?;
        let close = parse_time(&self.close)?;
        if open >= close {
            return Err(ValidationError::InvalidPeriod {
                open: self.open.clone(),
                close: self.close.clone(),
            });
        }
        Ok(Some((open, close)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    #[serde(default)]
    pub periods: Vec<BusinessPeriod>,
}

impl BusinessHours {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for period in &self.periods {
            period.times()?;
        }
        Ok(())
    }

    /// Checks the first period covering `day`; later periods are ignored.
    pub fn is_open_at(&self, day: Weekday, time: NaiveTime) -> bool {
        let Some(period) = self.periods.iter().find(|p| p.covers(day)) else {
            return false;
        };
        match period.times() {
            Ok(Some((open, close))) => open <= time && time < close,
            _ => false,
        }
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

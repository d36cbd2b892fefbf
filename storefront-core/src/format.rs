//! Display helpers shared by the CLI and item rendering.

use crate::models::BusinessPeriod;

/// Formats a price with two decimals. USD, EUR and GBP get a leading symbol;
/// other currencies get a trailing code.
pub fn format_price(value: f64, currency: &str) -> String {
    let currency = currency.trim().to_uppercase();
    match currency.as_str() {
        "USD" => format!("${:.2}", value),
        "EUR" => format!("€{:.2}", value),
        "GBP" => format!("£{:.2}", value),
        "" => format!("{:.2}", value),
        code => format!("{:.2} {}", value, code),
    }
}

/// Formats a 0-5 rating as e.g. `4.5/5`.
pub fn format_rating(rating: f64) -> String {
    format!("{:.1}/5", rating)
}

/// Formats a period as e.g. `Sun-Thu 09:00-17:00` or `Fri closed`.
pub fn format_period(period: &BusinessPeriod) -> String {
    let days = if period.from_day == period.to_day {
        period.from_day.to_string()
    } else {
        format!("{}-{}", period.from_day, period.to_day)
    };

    if period.closed {
        format!("{} closed", days)
    } else {
        format!("{} {}-{}", days, period.open, period.close)
    }
}

/// Click-to-chat link for a phone number. Formatting characters are dropped.
pub fn whatsapp_link(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("https://wa.me/{}", digits)
}

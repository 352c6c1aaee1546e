use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Native API wire format
// ============================================================================

/// Identifiers arrive as either JSON numbers or strings depending on the endpoint.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!("expected id, got {}", other))),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPrice {
    /// Pricing category id.
    pub id: i64,
    pub amount: Money,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatePrices {
    #[serde(default)]
    pub activity_rate_id: Option<i64>,
    #[serde(default)]
    pub price_per_category_unit: Vec<CategoryPrice>,
}

/// One entry of `GET /activity.json/{id}/availabilities`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Epoch milliseconds of the slot's day.
    pub date: i64,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub availability_count: i64,
    #[serde(default)]
    pub booked_participants: i64,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub sold_out: bool,
    #[serde(default)]
    pub prices_by_rate: Vec<RatePrices>,
}

impl AvailabilityEntry {
    pub fn day(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.date).map(|dt| dt.date_naive())
    }

    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let day = self.day()?;
        let time = self
            .start_time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
            .unwrap_or(NaiveTime::MIN);
        Some(day.and_time(time))
    }
}

// ============================================================================
// Normalised output
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub id: String,
    pub starts_at: NaiveDateTime,
    pub capacity: i64,
    pub booked: i64,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingCategory {
    pub category_id: i64,
    pub name: String,
    pub amount_minor: i64,
    pub currency: String,
    pub slot_id: String,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_accepts_numeric_ids_and_missing_rates() {
        let entry: AvailabilityEntry = serde_json::from_value(json!({
            "id": 981,
            "date": 1760745600000i64,
            "startTime": "10:30",
            "availabilityCount": 12
        }))
        .unwrap();
        assert_eq!(entry.id, "981");
        assert!(entry.prices_by_rate.is_empty());
        assert_eq!(entry.day(), NaiveDate::from_ymd_opt(2025, 10, 18));
        assert_eq!(entry.starts_at().unwrap().format("%H:%M").to_string(), "10:30");
    }
}

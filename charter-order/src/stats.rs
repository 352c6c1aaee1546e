use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use charter_core::records::AggregatedBookingRecord;
use charter_shared::money::format_minor;

/// Dashboard counters over one page of merged records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingStats {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub cancelled: usize,
    pub paid: usize,
    /// Revenue of paid bookings, minor units per currency.
    pub revenue_minor: BTreeMap<String, i64>,
    pub revenue_display: BTreeMap<String, String>,
    pub enriched: usize,
    pub degraded: usize,
    /// Total reported by the list query, which may exceed `total` when paging.
    pub upstream_total: u64,
}

/// Lowercases and folds `_`/`-` to spaces so "ON_HOLD" and "on hold" compare equal.
pub fn normalize_status(status: &str) -> String {
    status
        .trim()
        .to_ascii_lowercase()
        .replace(['_', '-'], " ")
}

fn bucket(status: &str) -> Option<StatusBucket> {
    match normalize_status(status).as_str() {
        "confirmed" => Some(StatusBucket::Confirmed),
        "pending" | "on hold" | "reserved" => Some(StatusBucket::Pending),
        "cancelled" | "canceled" => Some(StatusBucket::Cancelled),
        _ => None,
    }
}

enum StatusBucket {
    Confirmed,
    Pending,
    Cancelled,
}

impl BookingStats {
    pub fn compute(records: &[AggregatedBookingRecord], degraded: usize, upstream_total: u64) -> Self {
        let mut stats = BookingStats {
            total: records.len(),
            degraded,
            upstream_total,
            ..Default::default()
        };

        for record in records {
            match bucket(&record.status) {
                Some(StatusBucket::Confirmed) => stats.confirmed += 1,
                Some(StatusBucket::Pending) => stats.pending += 1,
                Some(StatusBucket::Cancelled) => stats.cancelled += 1,
                None => {}
            }
            if record.enriched {
                stats.enriched += 1;
            }
            if normalize_status(&record.payment_status) == "paid" {
                stats.paid += 1;
                *stats
                    .revenue_minor
                    .entry(record.currency.to_ascii_uppercase())
                    .or_insert(0) += record.amount_minor;
            }
        }

        stats.revenue_display = stats
            .revenue_minor
            .iter()
            .map(|(currency, amount)| (currency.clone(), format_minor(*amount, currency)))
            .collect();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_core::records::RawPayloads;

    fn record(status: &str, payment: &str, amount_minor: i64, currency: &str) -> AggregatedBookingRecord {
        AggregatedBookingRecord {
            id: "1".into(),
            confirmation_code: "N/A".into(),
            customer_name: "Unknown Customer".into(),
            customer_email: "Email not available".into(),
            customer_phone: "Phone not available".into(),
            date: "Date TBC".into(),
            guest_count: 0,
            status: status.into(),
            payment_status: payment.into(),
            amount_minor,
            currency: currency.into(),
            formatted_amount: format_minor(amount_minor, currency),
            enriched: true,
            raw: RawPayloads {
                list: serde_json::Value::Null,
                detail: None,
            },
        }
    }

    #[test]
    fn buckets_statuses_case_insensitively() {
        let records = vec![
            record("CONFIRMED", "PAID", 10000, "EUR"),
            record("ON_HOLD", "UNPAID", 5000, "EUR"),
            record("Reserved", "unknown", 0, "EUR"),
            record("CANCELED", "REFUNDED", 2000, "EUR"),
            record("ARRIVED", "paid", 2550, "EUR"),
        ];
        let stats = BookingStats::compute(&records, 0, 40);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.confirmed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.paid, 2);
        assert_eq!(stats.upstream_total, 40);
        assert_eq!(stats.revenue_minor.get("EUR"), Some(&12550));
        assert_eq!(stats.revenue_display.get("EUR").map(String::as_str), Some("€125.50"));
    }

    #[test]
    fn revenue_is_kept_per_currency() {
        let records = vec![
            record("CONFIRMED", "PAID", 10000, "EUR"),
            record("CONFIRMED", "PAID", 2500, "usd"),
            record("CONFIRMED", "PAID", 3000, "JPY"),
        ];
        let stats = BookingStats::compute(&records, 1, 3);

        assert_eq!(stats.revenue_minor.len(), 3);
        assert_eq!(stats.revenue_minor["USD"], 2500);
        assert_eq!(stats.revenue_display["JPY"], "JPY 3000");
        assert_eq!(stats.degraded, 1);
    }
}

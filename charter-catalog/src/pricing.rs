use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use charter_core::availability::{AvailabilityEntry, AvailabilitySlot, PricingCategory};
use charter_core::supplier::AvailabilitySource;
use charter_core::CoreResult;
use charter_shared::money::to_minor;

use crate::categories::CategoryNames;
use crate::inventory::to_slot;

/// Days covered by a single fetch, starting today.
pub const LOOKAHEAD_DAYS: i64 = 7;

/// Result of one availability/pricing fetch. Never cached between requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PricingSnapshot {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub slots: Vec<AvailabilitySlot>,
    pub categories: Vec<PricingCategory>,
}

/// Fetches a rolling week of slots for one activity and the price categories offered in it.
pub struct AvailabilityPricingFetcher {
    source: Arc<dyn AvailabilitySource>,
    names: CategoryNames,
    activity_id: String,
}

impl AvailabilityPricingFetcher {
    pub fn new(source: Arc<dyn AvailabilitySource>, names: CategoryNames, activity_id: impl Into<String>) -> Self {
        Self {
            source,
            names,
            activity_id: activity_id.into(),
        }
    }

    pub async fn fetch_upcoming(&self) -> CoreResult<PricingSnapshot> {
        self.fetch_from(Utc::now().date_naive()).await
    }

    /// One signed request for the whole window; any upstream failure aborts the fetch.
    pub async fn fetch_from(&self, today: NaiveDate) -> CoreResult<PricingSnapshot> {
        let window_end = today + Duration::days(LOOKAHEAD_DAYS);
        let entries = self.source.availabilities(&self.activity_id, today, window_end).await?;

        let slots: Vec<AvailabilitySlot> = entries.iter().filter_map(to_slot).collect();
        let categories = extract_categories(&entries, &self.names);

        tracing::info!(
            activity_id = %self.activity_id,
            %today,
            slots = slots.len(),
            categories = categories.len(),
            "fetched availability window"
        );

        Ok(PricingSnapshot {
            window_start: today,
            window_end,
            slots,
            categories,
        })
    }
}

/// Flattens every rate group's category prices in iteration order, keeping the first
/// occurrence of each category id.
pub fn extract_categories(entries: &[AvailabilityEntry], names: &CategoryNames) -> Vec<PricingCategory> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for entry in entries {
        let Some(date) = entry.day() else {
            continue;
        };
        for rate in &entry.prices_by_rate {
            for price in &rate.price_per_category_unit {
                if !seen.insert(price.id) {
                    continue;
                }
                out.push(PricingCategory {
                    category_id: price.id,
                    name: names.label(price.id),
                    amount_minor: to_minor(price.amount.amount, &price.amount.currency),
                    currency: price.amount.currency.clone(),
                    slot_id: entry.id.clone(),
                    date,
                });
            }
        }
    }
    out
}

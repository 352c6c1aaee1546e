use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::Instant;

use charter_core::oauth::AccessToken;
use charter_core::records::{AggregatedBookingRecord, BookingDetail, BookingNode, BookingQuery, RawPayloads};
use charter_core::supplier::BookingSource;
use charter_core::{CoreError, CoreResult};
use charter_shared::money::{format_minor, to_minor};

use crate::stats::BookingStats;

pub const UNKNOWN_CODE: &str = "N/A";
pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
pub const NO_EMAIL: &str = "Email not available";
pub const NO_PHONE: &str = "Phone not available";
pub const NO_DATE: &str = "Date TBC";
pub const UNKNOWN_STATUS: &str = "unknown";

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub max_concurrency: usize,
    pub detail_timeout: Duration,
    /// Budget for the whole enrichment phase; records past it keep list-only fields.
    pub overall_timeout: Duration,
    pub default_currency: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            detail_timeout: Duration::from_millis(5_000),
            overall_timeout: Duration::from_millis(20_000),
            default_currency: "EUR".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedPage {
    pub records: Vec<AggregatedBookingRecord>,
    pub stats: BookingStats,
    /// One line per record that fell back to list fields.
    pub warnings: Vec<String>,
}

/// Lists bookings in bulk and enriches each with its native detail record.
pub struct BookingAggregator {
    source: Arc<dyn BookingSource>,
    config: AggregatorConfig,
}

impl BookingAggregator {
    pub fn new(source: Arc<dyn BookingSource>, config: AggregatorConfig) -> Self {
        Self { source, config }
    }

    /// A failed list query fails the whole call. Failed enrichment never does.
    pub async fn aggregate(&self, token: &AccessToken, query: &BookingQuery, enrich: bool) -> CoreResult<AggregatedPage> {
        let page = self.source.list_bookings(token, query).await?;
        tracing::debug!(domain = %token.domain, nodes = page.nodes.len(), total = page.total, "booking list fetched");

        let details: Vec<Result<Option<BookingDetail>, CoreError>> = if enrich {
            let deadline = Instant::now() + self.config.overall_timeout;
            let lookups: Vec<BoxFuture<'_, Result<Option<BookingDetail>, CoreError>>> = page
                .nodes
                .iter()
                .map(|node| self.enrich_one(node, deadline).boxed())
                .collect();
            stream::iter(lookups)
                .buffered(self.config.max_concurrency.max(1))
                .collect()
                .await
        } else {
            page.nodes.iter().map(|_| Ok(None)).collect()
        };

        let mut warnings = Vec::new();
        let records: Vec<AggregatedBookingRecord> = page
            .nodes
            .iter()
            .zip(details)
            .map(|(node, detail)| {
                let detail = detail.unwrap_or_else(|e| {
                    tracing::warn!(booking_id = %node.id, error = %e, "enrichment failed; using list fields");
                    warnings.push(e.to_string());
                    None
                });
                merge_record(node, detail.as_ref(), &self.config.default_currency)
            })
            .collect();

        let stats = BookingStats::compute(&records, warnings.len(), page.total);
        tracing::info!(
            records = stats.total,
            enriched = stats.enriched,
            degraded = stats.degraded,
            "booking aggregation complete"
        );

        Ok(AggregatedPage {
            records,
            stats,
            warnings,
        })
    }

    async fn enrich_one(&self, node: &BookingNode, deadline: Instant) -> Result<Option<BookingDetail>, CoreError> {
        let Some(code) = node.confirmation_code.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let now = Instant::now();
        if now >= deadline {
            return Err(CoreError::PartialEnrichment {
                code: code.to_string(),
                reason: "enrichment budget exhausted".into(),
            });
        }
        let until = (now + self.config.detail_timeout).min(deadline);

        match tokio::time::timeout_at(until, self.source.booking_detail(code)).await {
            Ok(Ok(Some(detail))) if !detail.is_empty() => Ok(Some(detail)),
            Ok(Ok(_)) => Ok(None),
            Ok(Err(e)) => Err(CoreError::PartialEnrichment {
                code: code.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(CoreError::PartialEnrichment {
                code: code.to_string(),
                reason: CoreError::Timeout(until.duration_since(now).as_millis() as u64).to_string(),
            }),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

fn join_name(first: Option<&String>, last: Option<&String>) -> Option<String> {
    let name = [first, last]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Payment state from the detail's amounts when no explicit status was sent.
///
/// Settled means the paid amount covers a positive price and nothing is reported due.
/// An absent due amount is never read as zero.
fn derive_payment_status(detail: &BookingDetail) -> Option<String> {
    if detail.total_paid.is_none() && detail.total_due.is_none() {
        return None;
    }
    let paid = detail.total_paid.unwrap_or(0.0);
    let covers_price = detail.total_price.map(|total| total > 0.0 && paid >= total);
    let nothing_due = detail.total_due.map(|due| due <= 0.0);

    let settled = match (covers_price, nothing_due) {
        (Some(covers), Some(clear)) => covers && clear,
        (Some(covers), None) => covers,
        (None, Some(clear)) => clear && paid > 0.0,
        (None, None) => false,
    };
    let status = if settled {
        "paid"
    } else if paid > 0.0 {
        "partial"
    } else {
        "unpaid"
    };
    Some(status.to_string())
}

/// Builds one dashboard row. Each field prefers the detail record, then the list node,
/// then a fixed placeholder.
pub fn merge_record(node: &BookingNode, detail: Option<&BookingDetail>, default_currency: &str) -> AggregatedBookingRecord {
    let detail_customer = detail.and_then(|d| d.customer.as_ref());
    let list_customer = node.customer.as_ref();

    let confirmation_code = detail
        .and_then(|d| non_empty(d.confirmation_code.as_ref()))
        .or_else(|| non_empty(node.confirmation_code.as_ref()))
        .unwrap_or_else(|| UNKNOWN_CODE.to_string());

    let customer_name = detail_customer
        .and_then(|c| join_name(c.first_name.as_ref(), c.last_name.as_ref()))
        .or_else(|| list_customer.and_then(|c| join_name(c.first_name.as_ref(), c.last_name.as_ref())))
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string());

    let customer_email = detail_customer
        .and_then(|c| non_empty(c.email.as_ref()))
        .or_else(|| list_customer.and_then(|c| non_empty(c.email.as_ref())))
        .unwrap_or_else(|| NO_EMAIL.to_string());

    let customer_phone = detail_customer
        .and_then(|c| non_empty(c.phone_number.as_ref()))
        .or_else(|| list_customer.and_then(|c| non_empty(c.phone_number.as_ref())))
        .unwrap_or_else(|| NO_PHONE.to_string());

    let date = detail
        .and_then(|d| d.activity_bookings.iter().find_map(|a| a.date))
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .or_else(|| non_empty(node.start_date.as_ref()))
        .unwrap_or_else(|| NO_DATE.to_string());

    let detail_guests: i64 = detail
        .map(|d| d.activity_bookings.iter().filter_map(|a| a.total_participants).sum())
        .unwrap_or(0);
    let guest_count = if detail_guests > 0 {
        detail_guests
    } else {
        node.total_participants.unwrap_or(0)
    };

    let status = detail
        .and_then(|d| non_empty(d.status.as_ref()))
        .or_else(|| non_empty(node.status.as_ref()))
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

    let payment_status = detail
        .and_then(|d| non_empty(d.payment_status.as_ref()))
        .or_else(|| non_empty(node.payment_status.as_ref()))
        .or_else(|| detail.and_then(derive_payment_status))
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

    let (amount, currency) = match (detail.and_then(|d| d.total_price), node.total_price.as_ref()) {
        (Some(amount), list) => {
            let currency = detail
                .and_then(|d| non_empty(d.currency.as_ref()))
                .or_else(|| list.map(|m| m.currency.clone()))
                .unwrap_or_else(|| default_currency.to_string());
            (amount, currency)
        }
        (None, Some(money)) => (money.amount, money.currency.clone()),
        (None, None) => (
            0.0,
            detail
                .and_then(|d| non_empty(d.currency.as_ref()))
                .unwrap_or_else(|| default_currency.to_string()),
        ),
    };
    let currency = currency.to_ascii_uppercase();
    let amount_minor = to_minor(amount, &currency);

    AggregatedBookingRecord {
        id: node.id.clone(),
        confirmation_code,
        customer_name,
        customer_email,
        customer_phone,
        date,
        guest_count,
        status,
        payment_status,
        amount_minor,
        formatted_amount: format_minor(amount_minor, &currency),
        currency,
        enriched: detail.is_some(),
        raw: RawPayloads {
            list: node.raw.clone(),
            detail: detail.map(|d| d.raw.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use charter_core::availability::Money;
    use charter_core::records::{ActivityBooking, BookingPage, DetailCustomer, ListCustomer};
    use chrono::Utc;
    use std::sync::Mutex;

    struct StubSource {
        nodes: Vec<BookingNode>,
        detail_calls: Mutex<Vec<String>>,
        fail_list: bool,
    }

    impl StubSource {
        fn with_codes(codes: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                nodes: codes.iter().enumerate().map(|(i, c)| node(i, Some(c))).collect(),
                detail_calls: Mutex::new(Vec::new()),
                fail_list: false,
            })
        }
    }

    #[async_trait]
    impl BookingSource for StubSource {
        async fn list_bookings(&self, _token: &AccessToken, _query: &BookingQuery) -> CoreResult<BookingPage> {
            if self.fail_list {
                return Err(CoreError::UpstreamHttp { status: 502, body: "gateway".into() });
            }
            Ok(BookingPage {
                total: self.nodes.len() as u64,
                nodes: self.nodes.clone(),
            })
        }

        async fn booking_detail(&self, code: &str) -> CoreResult<Option<BookingDetail>> {
            self.detail_calls.lock().unwrap().push(code.to_string());
            if code.starts_with("slow") {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if code.starts_with("missing") {
                return Ok(None);
            }
            if code.starts_with("broken") {
                return Err(CoreError::UpstreamHttp { status: 500, body: "oops".into() });
            }
            Ok(Some(detail(code)))
        }
    }

    fn token() -> AccessToken {
        AccessToken {
            value: "tok".into(),
            scopes: vec![],
            vendor_id: None,
            domain: "charters".into(),
            acquired_at: Utc::now(),
        }
    }

    fn node(i: usize, code: Option<&str>) -> BookingNode {
        BookingNode {
            id: format!("{}", 1000 + i),
            confirmation_code: code.map(str::to_string),
            status: Some("CONFIRMED".into()),
            start_date: Some("2026-10-20".into()),
            total_price: Some(Money {
                amount: 99.5,
                currency: "EUR".into(),
            }),
            payment_status: None,
            customer: Some(ListCustomer {
                first_name: Some("List".into()),
                last_name: Some("Name".into()),
                email: Some("list@example.com".into()),
                phone_number: None,
            }),
            total_participants: Some(2),
            raw: serde_json::json!({"id": 1000 + i}),
        }
    }

    fn detail(code: &str) -> BookingDetail {
        BookingDetail {
            confirmation_code: Some(code.to_string()),
            status: Some("CONFIRMED".into()),
            customer: Some(DetailCustomer {
                first_name: Some("Ana".into()),
                last_name: Some("Kovač".into()),
                email: Some("ana@example.com".into()),
                phone_number: Some("+385 91 111 222".into()),
            }),
            total_price: Some(450.0),
            currency: Some("EUR".into()),
            payment_status: None,
            total_paid: Some(450.0),
            total_due: Some(0.0),
            activity_bookings: vec![ActivityBooking {
                date: Some(1792454400000),
                total_participants: Some(4),
            }],
            raw: serde_json::json!({"confirmationCode": code}),
        }
    }

    fn config() -> AggregatorConfig {
        AggregatorConfig {
            max_concurrency: 8,
            detail_timeout: Duration::from_secs(2),
            overall_timeout: Duration::from_secs(5),
            default_currency: "EUR".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_details_degrade_without_failing() {
        let codes = ["c0", "c1", "c2", "slow3", "c4", "c5", "c6", "slow7", "c8", "c9"];
        let source = StubSource::with_codes(&codes);
        let aggregator = BookingAggregator::new(source.clone(), config());

        let started = Instant::now();
        let page = aggregator.aggregate(&token(), &BookingQuery::default(), true).await.unwrap();

        assert_eq!(page.records.len(), 10);
        assert_eq!(page.stats.enriched, 8);
        assert_eq!(page.stats.degraded, 2);
        assert_eq!(page.warnings.len(), 2);
        assert!(started.elapsed() < Duration::from_secs(5));

        let ids: Vec<&str> = page.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1000", "1001", "1002", "1003", "1004", "1005", "1006", "1007", "1008", "1009"]);

        let slow = &page.records[3];
        assert!(!slow.enriched);
        assert_eq!(slow.customer_name, "List Name");
        assert_eq!(slow.amount_minor, 9950);
        let fast = &page.records[4];
        assert!(fast.enriched);
        assert_eq!(fast.customer_name, "Ana Kovač");
    }

    #[tokio::test(start_paused = true)]
    async fn overall_budget_stops_further_calls() {
        let source = StubSource::with_codes(&["slow0", "slow1", "c2", "c3"]);
        let aggregator = BookingAggregator::new(
            source.clone(),
            AggregatorConfig {
                max_concurrency: 1,
                detail_timeout: Duration::from_secs(2),
                overall_timeout: Duration::from_secs(3),
                default_currency: "EUR".into(),
            },
        );

        let page = aggregator.aggregate(&token(), &BookingQuery::default(), true).await.unwrap();

        assert_eq!(page.records.len(), 4);
        assert_eq!(page.stats.enriched, 0);
        assert_eq!(page.stats.degraded, 4);
        assert_eq!(source.detail_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn enrichment_can_be_disabled() {
        let source = StubSource::with_codes(&["c0", "c1"]);
        let aggregator = BookingAggregator::new(source.clone(), config());

        let page = aggregator.aggregate(&token(), &BookingQuery::default(), false).await.unwrap();

        assert_eq!(page.records.len(), 2);
        assert_eq!(page.stats.enriched, 0);
        assert_eq!(page.stats.degraded, 0);
        assert!(source.detail_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_and_failed_details_fall_back() {
        let source = StubSource::with_codes(&["missing0", "broken1"]);
        let aggregator = BookingAggregator::new(source, config());

        let page = aggregator.aggregate(&token(), &BookingQuery::default(), true).await.unwrap();

        assert_eq!(page.stats.degraded, 1);
        assert!(page.warnings[0].contains("broken1"));
        assert!(page.records.iter().all(|r| !r.enriched));
    }

    #[tokio::test]
    async fn list_failure_is_fatal() {
        let source = Arc::new(StubSource {
            nodes: vec![],
            detail_calls: Mutex::new(Vec::new()),
            fail_list: true,
        });
        let aggregator = BookingAggregator::new(source, config());

        let err = aggregator.aggregate(&token(), &BookingQuery::default(), true).await.unwrap_err();
        assert!(matches!(err, CoreError::UpstreamHttp { status: 502, .. }));
    }

    #[test]
    fn detail_fields_win_over_list_fields() {
        let record = merge_record(&node(0, Some("LIST-1")), Some(&detail("DET-1")), "EUR");

        assert_eq!(record.confirmation_code, "DET-1");
        assert_eq!(record.customer_name, "Ana Kovač");
        assert_eq!(record.customer_email, "ana@example.com");
        assert_eq!(record.customer_phone, "+385 91 111 222");
        assert_eq!(record.date, "2026-10-20");
        assert_eq!(record.guest_count, 4);
        assert_eq!(record.payment_status, "paid");
        assert_eq!(record.amount_minor, 45000);
        assert_eq!(record.formatted_amount, "€450.00");
        assert!(record.enriched);
        assert!(record.raw.detail.is_some());
    }

    #[test]
    fn list_fields_fill_gaps_then_defaults() {
        let mut bare = node(0, None);
        bare.customer = None;
        bare.start_date = None;
        bare.status = None;
        bare.total_price = None;
        bare.total_participants = None;

        let record = merge_record(&bare, None, "EUR");

        assert_eq!(record.confirmation_code, UNKNOWN_CODE);
        assert_eq!(record.customer_name, UNKNOWN_CUSTOMER);
        assert_eq!(record.customer_email, NO_EMAIL);
        assert_eq!(record.customer_phone, NO_PHONE);
        assert_eq!(record.date, NO_DATE);
        assert_eq!(record.guest_count, 0);
        assert_eq!(record.status, UNKNOWN_STATUS);
        assert_eq!(record.payment_status, UNKNOWN_STATUS);
        assert_eq!(record.amount_minor, 0);
        assert_eq!(record.currency, "EUR");
        assert!(!record.enriched);

        let partial = merge_record(&node(1, Some("L-2")), None, "EUR");
        assert_eq!(partial.customer_email, "list@example.com");
        assert_eq!(partial.customer_phone, NO_PHONE);
        assert_eq!(partial.date, "2026-10-20");
        assert_eq!(partial.guest_count, 2);
    }

    #[test]
    fn partial_payment_is_derived_from_amounts() {
        let mut d = detail("D-1");
        d.total_paid = Some(100.0);
        d.total_due = Some(350.0);
        let record = merge_record(&node(0, Some("D-1")), Some(&d), "EUR");
        assert_eq!(record.payment_status, "partial");
    }

    #[test]
    fn missing_due_amount_is_not_read_as_settled() {
        let mut d = detail("D-2");
        d.total_paid = Some(100.0);
        d.total_due = None;
        let partial = merge_record(&node(0, Some("D-2")), Some(&d), "EUR");
        assert_eq!(partial.payment_status, "partial");
        assert_eq!(partial.amount_minor, 45000);

        d.total_paid = Some(450.0);
        let settled = merge_record(&node(1, Some("D-2")), Some(&d), "EUR");
        assert_eq!(settled.payment_status, "paid");

        let stats = BookingStats::compute(&[partial, settled], 0, 2);
        assert_eq!(stats.paid, 1);
        assert_eq!(stats.revenue_minor.get("EUR"), Some(&45000));
    }

    #[test]
    fn paid_amount_below_price_is_partial_even_when_nothing_due() {
        let mut d = detail("D-3");
        d.total_paid = Some(100.0);
        d.total_due = Some(0.0);
        let record = merge_record(&node(0, Some("D-3")), Some(&d), "EUR");
        assert_eq!(record.payment_status, "partial");

        d.total_paid = None;
        d.total_due = None;
        let record = merge_record(&node(0, Some("D-3")), Some(&d), "EUR");
        assert_eq!(record.payment_status, UNKNOWN_STATUS);
    }

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn aggregate_future_is_send() {
        let aggregator = BookingAggregator::new(StubSource::with_codes(&["c0"]), config());
        let query = BookingQuery::default();
        let token = token();
        assert_send(aggregator.aggregate(&token, &query, true));
    }

    #[tokio::test]
    async fn aggregate_runs_on_a_spawned_task() {
        let aggregator = Arc::new(BookingAggregator::new(StubSource::with_codes(&["c0", "c1"]), config()));
        let handle = tokio::spawn(async move {
            let query = BookingQuery::default();
            aggregator.aggregate(&token(), &query, true).await
        });

        let page = handle.await.unwrap().unwrap();
        assert_eq!(page.stats.enriched, 2);
    }
}

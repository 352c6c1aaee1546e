pub mod aggregator;
pub mod orchestrator;
pub mod stats;

pub use aggregator::{AggregatedPage, AggregatorConfig, BookingAggregator};
pub use orchestrator::{BookingOrchestrator, BookingOutcome, BookingRequest, OrchestratorConfig};
pub use stats::BookingStats;

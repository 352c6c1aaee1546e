pub mod categories;
pub mod inventory;
pub mod pricing;

pub use categories::CategoryNames;
pub use inventory::to_slot;
pub use pricing::{AvailabilityPricingFetcher, PricingSnapshot};

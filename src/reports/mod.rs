// Reports module - allocation snapshot and daily timeline

pub mod aggregate;
pub mod allocation;
pub mod timeline;

pub use aggregate::{account_prefixes, compute_aggregate, Aggregate, Snapshot};
pub use allocation::{generate_allocation, AllocationReport};
pub use timeline::{compute_aggregate_timeline, timeline_dates};

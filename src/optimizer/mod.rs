//! Cost-based optimizer statistics.
//!
//! - [`IntHistogram`] / [`TextHistogram`] - constant-space per-column
//!   value distributions
//! - [`TableStats`] - one table's histograms plus scan-cost and
//!   cardinality estimates

mod histogram;
mod table_stats;

pub use histogram::{IntHistogram, TextHistogram};
pub use table_stats::{TableStats, NUM_HIST_BUCKETS};

//! Daily water-delivery metrics.
//!
//! Pure functions over an immutable [`ReadingSeries`](crate::model::ReadingSeries):
//! pumping time and flow per calendar day, litres per capita per day, and
//! window means for the quality parameters. Nothing here holds state between
//! calls, so each dashboard refresh recomputes from the full series.

pub mod aggregate;
pub mod format;
pub mod lpcd;
pub mod pumping;
pub mod types;
pub mod utility;
pub mod window;

pub use aggregate::daily_metrics;
pub use lpcd::{Population, lpcd, weekly_lpcd};
pub use pumping::{AggregatorOptions, NegativeFlow, TrailingInterval, daily_pumping};
pub use types::{DailyMetrics, DailyPumping, WindowStats};
pub use window::{Window, window_stats};

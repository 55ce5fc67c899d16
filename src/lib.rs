//! Shift-offer reporting: normalize a raw extract of shift-offer events into
//! typed records, then answer ranking, counting and trend queries over them.
//!
//! The flow is `loader` (CSV) -> [`normalize::normalize_all`] ->
//! [`query`] functions / [`reports::ReportBundle`] -> [`output`] writers.
pub mod error;
pub mod fields;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod period;
pub mod query;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{ConfigError, ReportError};
pub use fields::{Field, FieldValue, FlagField, MetricField};
pub use normalize::{normalize, normalize_all};
pub use period::{MonthPeriod, Period};
pub use query::{OfferFilter, Query, QueryConfig, Table};
pub use reports::ReportBundle;
pub use types::{RawRow, ShiftOffer};

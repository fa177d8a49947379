//! Descriptive aggregation over enriched records.
//!
//! Every table is built in two explicit phases: rows are partitioned by key
//! in first-seen order, then each group is reduced to a summary row.
//!
//! - [`customer_summaries`] / [`product_summaries`]: per-entity statistics,
//!   sorted by `total_profit` descending
//! - [`time_series`]: monthly or yearly buckets, optionally split by a
//!   [`Dimension`](crate::types::Dimension)
//! - [`period_shares`]: each dimension value's share of its period
//! - [`margin_overview`]: overall and mean-of-entity margins

pub mod entities;
pub mod grouping;
pub mod time_series;

pub use entities::{customer_summaries, margin_overview, product_summaries, sort_by_total_profit};
pub use grouping::{count_distinct, group_reduce, mean, partition, ratio};
pub use time_series::{period_shares, time_series};

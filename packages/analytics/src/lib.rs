#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and lookup over displacement and conflict records.
//!
//! Everything here is pure and synchronous: records go in, a
//! [`Summary`](idp_map_analytics_models::Summary) or a chart-ready view
//! comes out. Loading and selection state live in the session crate.

pub mod aggregate;
pub mod derived;
pub mod query;
pub mod views;

pub use aggregate::aggregate_by_entity_and_period;
pub use query::query_entity_totals;

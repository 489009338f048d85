//! mayordomo - answers "what is the current value of metric X" from the
//! latest stored system snapshot, and reports the busiest live processes.
//!
//! The library holds the query engine; the `mayordomo` binary is a thin
//! line-oriented front end over it:
//! - [`catalog`] / [`command`] turn user text into a metric lookup
//! - [`storage`] reads the newest row from SQLite or a Parquet directory
//! - [`fmt`] renders raw values with their units
//! - [`collector`] / [`ranker`] sample `/proc` for the top-N CPU report
//! - [`engine`] ties them together

pub mod catalog;
pub mod collector;
pub mod command;
pub mod config;
pub mod engine;
pub mod fmt;
pub mod ranker;
pub mod storage;
pub mod util;

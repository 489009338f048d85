//! Utility modules for mayordomo.

mod time_parser;

pub use time_parser::{SNAPSHOT_TIMESTAMP_FORMAT, TimeParseError, parse_snapshot_timestamp};

//! Fixed layout of the `metricas` table written by the external collector.
//!
//! Both storage variants bind rows to this column list. The order matters for
//! the row store, which reads columns positionally.

use crate::fmt::Unit;

/// Table name used by the writer.
pub const DEFAULT_TABLE: &str = "metricas";

/// Column used to pick the latest row.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// A single column of the metrics table and the unit its values carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub unit: Unit,
}

const fn col(name: &'static str, unit: Unit) -> Column {
    Column { name, unit }
}

/// Columns of the `metricas` table, in `CREATE TABLE` order.
pub static METRICS_COLUMNS: [Column; 23] = [
    col("timestamp", Unit::Timestamp),
    col("hostname", Unit::Text),
    col("username", Unit::Text),
    col("cpu_percent", Unit::Percent),
    col("cpu_freq", Unit::Megahertz),
    col("ram_percent", Unit::Percent),
    col("ram_used", Unit::Gigabytes),
    col("ram_total", Unit::Gigabytes),
    col("ram_free", Unit::Gigabytes),
    col("disk_percent", Unit::Percent),
    col("disk_used", Unit::Gigabytes),
    col("disk_total", Unit::Gigabytes),
    col("disk_free", Unit::Gigabytes),
    col("swap_percent", Unit::Percent),
    col("swap_usado", Unit::Gigabytes),
    col("swap_total", Unit::Gigabytes),
    col("red_bytes_sent", Unit::Megabytes),
    col("red_bytes_recv", Unit::Megabytes),
    col("cpu_temp_celsius", Unit::Celsius),
    col("battery_percent", Unit::Percent),
    col("cpu_power_package", Unit::Watts),
    col("cpu_power_cores", Unit::Watts),
    col("cpu_clocks", Unit::Megahertz),
];

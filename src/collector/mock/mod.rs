//! In-memory stand-ins for `/proc`, used by tests and on non-Linux hosts.

pub mod filesystem;

pub use filesystem::{MockFs, stat_line};

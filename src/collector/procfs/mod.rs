//! Process CPU sampling from the Linux `/proc` filesystem.

pub mod parser;
pub mod sampler;

pub use parser::{ParseError, ProcStat, parse_proc_stat};
pub use sampler::{CLOCK_TICKS_PER_SECOND, CollectError, ProcfsSampler};

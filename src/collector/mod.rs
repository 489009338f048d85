//! Live process sampling from the Linux `/proc` filesystem.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │            ProcfsSampler             │
//! │  - /proc/[pid]/stat  (CPU ticks)     │
//! │  - /proc/[pid]/comm  (process name)  │
//! └──────────────────┬───────────────────┘
//!                    │
//!             ┌──────▼──────┐
//!             │  FileSystem │ (trait)
//!             └──────┬──────┘
//!           ┌────────┴────────┐
//!    ┌──────▼──────┐   ┌──────▼──────┐
//!    │   RealFs    │   │   MockFs    │
//!    │  (Linux)    │   │  (Testing)  │
//!    └─────────────┘   └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use mayordomo::collector::{MockFs, ProcfsSampler};
//! use mayordomo::ranker::ProcessSampler;
//!
//! let mut sampler = ProcfsSampler::new(MockFs::typical_system(), "/proc");
//! let samples = sampler.sample(Duration::from_millis(1)).unwrap();
//! assert_eq!(samples.len(), 3);
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{CollectError, ProcfsSampler};
pub use traits::{FileSystem, RealFs};

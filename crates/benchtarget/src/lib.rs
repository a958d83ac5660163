//! Call-counting benchmark target.
//!
//! A benchmark target is a device a hosting runtime calls into while a
//! benchmark client measures round trips. It counts every category of call
//! it receives and offers two resizable payload buffers for bandwidth runs:
//!
//! - [`CounterBank`]: one counter per [`Category`] plus the reset timer
//! - [`BufferStore`]: the spectrum (1-D) and image (2-D) `f64` buffers
//! - [`BenchmarkTarget`]: host-facing entry points (attributes, pipe,
//!   commands, lifecycle hooks) gated by the static [`policy`] table
//! - [`TargetConfig`]: TOML configuration
//! - [`MetricsExporter`]: Prometheus text rendering of counter snapshots
//! - [`workload`]: synthetic client sessions used by `benchtargetd`
//!
//! # Example
//!
//! ```
//! use benchtarget::{BenchmarkTarget, Category, TargetConfig};
//!
//! let mut config = TargetConfig::default();
//! config.buffers.image_rows = 2;
//! config.buffers.image_cols = 3;
//! let target = BenchmarkTarget::new(&config).unwrap();
//!
//! target.always_executed_hook();
//! target.write_benchmark_scalar(1.5);
//! assert_eq!(target.read_benchmark_scalar(), 1.5);
//!
//! target
//!     .write_image_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
//!     .unwrap();
//! assert_eq!(target.count(Category::ImageWrite), 1);
//!
//! target.reset_counters();
//! assert_eq!(target.snapshot().total(), 0);
//! ```

pub mod attributes;
pub mod buffers;
pub mod config;
pub mod counters;
pub mod error;
pub mod metrics;
pub mod pipe;
pub mod policy;
pub mod target;
pub mod workload;

// Re-export commonly used items at crate root
pub use attributes::{Access, Attribute, AttributeValue, Command, CommandArg};
pub use buffers::{BufferStore, ImageFrame, MAX_IMAGE_DIM, MAX_SPECTRUM_LENGTH};
pub use config::TargetConfig;
pub use counters::{Category, CounterBank, CounterSnapshot};
pub use error::{BenchmarkError, Result};
pub use metrics::MetricsExporter;
pub use pipe::{PipeBlob, PipeElement, PipeValue};
pub use policy::Request;
pub use target::BenchmarkTarget;
pub use workload::{run_session, Budget, CallKind, SessionReport, Workload};

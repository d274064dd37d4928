//! Filesystem dataset recorder for flowlens.
//!
//! Implements the [`workflow_core::DatasetSink`] port: each run gets its own
//! directory under the dataset root, keyed by app, sanitized task, and start
//! timestamp so concurrent runs never collide. States land as numbered
//! screenshot/snapshot pairs; the frozen run summary lands as `run.json`.

pub mod naming;
pub mod recorder;

pub use naming::{run_dir_name, sanitize_component};
pub use recorder::FsDatasetRecorder;

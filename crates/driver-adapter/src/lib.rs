//! Browser driver boundary for flowlens.
//!
//! The orchestration layers never talk to a browser directly; they wire
//! against the [`BrowserDriver`] trait defined here. Two implementations
//! ship with the workspace: [`StubDriver`], a scriptable in-memory driver
//! used by tests and offline development, and [`RemoteDriver`], a thin JSON
//! bridge to an out-of-process driver service.

pub mod driver;
pub mod errors;
pub mod model;
pub mod remote;
pub mod stub;

pub use driver::BrowserDriver;
pub use errors::{DriverError, DriverErrorKind};
pub use model::{
    BoundingBox, ElementDescriptor, EventKind, ImageFormat, Screenshot, OVERLAY_ROLES,
};
pub use remote::{RemoteDriver, RemoteDriverConfig};
pub use stub::{StubDriver, StubPage};

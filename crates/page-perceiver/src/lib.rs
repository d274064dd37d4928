//! Page perception for flowlens.
//!
//! Builds lightweight [`PageSignature`]s from element snapshots and decides,
//! via the pure [`StateChangeDetector`], whether two consecutive signatures
//! represent a meaningful interface change worth capturing.

pub mod detector;
pub mod signature;
pub mod snapshot;

pub use detector::{ChangeReason, ChangeVerdict, DriftTolerance, StateChangeDetector};
pub use signature::PageSignature;
pub use snapshot::{ElementTuple, StructuralSnapshot};

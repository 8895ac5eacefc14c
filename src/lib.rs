//! Offline consistency verifier for Ashlar control-plane database exports.
//!
//! The Ashlar control plane persists its cluster/node/device/brick/volume
//! graph as records that reference each other by bare identifier. This crate
//! loads a full database export, runs a fixed battery of referential checks
//! over it, and reports every violation it finds. It never repairs anything:
//! a missing link is reported, not inferred.

#![warn(missing_docs)]

pub mod check;
pub mod error;
pub mod model;
pub mod report;
pub mod snapshot;

pub use check::{check_snapshot, CheckOutcome, EntityType, Issue, Tally};
pub use error::{DbCheckError, Result};
pub use report::{RunReport, Summary, TypeCount};
pub use snapshot::Snapshot;

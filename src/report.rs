//! Report aggregation and rendering.
//!
//! The aggregator consumes the loaded snapshot and the checker's outcome and
//! produces the run's report: an entity census per type (with in-flight
//! pending counts), the issue stream, and the overall verdict. Text output
//! keeps the historical layout so existing tooling can keep scraping it.

use std::fmt;

use serde::Serialize;

use crate::check::{CheckOutcome, Issue, Tally};
use crate::snapshot::Snapshot;

/// Census of one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    /// Entities of this type in the snapshot.
    pub total: usize,
    /// Of those, how many carry a non-empty pending marker.
    pub pending: usize,
}

impl TypeCount {
    fn new(total: usize, pending: usize) -> Self {
        TypeCount { total, pending }
    }
}

/// Per-type entity counts for a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Cluster census.
    pub clusters: TypeCount,
    /// Node census.
    pub nodes: TypeCount,
    /// Device census.
    pub devices: TypeCount,
    /// Brick census.
    pub bricks: TypeCount,
    /// Volume census.
    pub volumes: TypeCount,
    /// Block-volume census.
    pub block_volumes: TypeCount,
    /// Pending-operation census.
    pub pending_ops: TypeCount,
}

impl Summary {
    /// Counts every collection in one pass over the snapshot.
    pub fn scan(snapshot: &Snapshot) -> Self {
        Summary {
            clusters: TypeCount::new(snapshot.clusters.len(), 0),
            nodes: TypeCount::new(snapshot.nodes.len(), 0),
            devices: TypeCount::new(
                snapshot.devices.len(),
                snapshot
                    .devices
                    .values()
                    .filter(|d| d.pending.is_pending())
                    .count(),
            ),
            bricks: TypeCount::new(
                snapshot.bricks.len(),
                snapshot
                    .bricks
                    .values()
                    .filter(|b| b.pending.is_pending())
                    .count(),
            ),
            volumes: TypeCount::new(
                snapshot.volumes.len(),
                snapshot
                    .volumes
                    .values()
                    .filter(|v| v.pending.is_pending())
                    .count(),
            ),
            block_volumes: TypeCount::new(
                snapshot.block_volumes.len(),
                snapshot
                    .block_volumes
                    .values()
                    .filter(|bv| bv.pending.is_pending())
                    .count(),
            ),
            pending_ops: TypeCount::new(snapshot.pending_operations.len(), 0),
        }
    }

    fn rows(&self) -> [(&'static str, TypeCount); 7] {
        [
            ("Clusters", self.clusters),
            ("Nodes", self.nodes),
            ("Devices", self.devices),
            ("Bricks", self.bricks),
            ("Volumes", self.volumes),
            ("Blockvolumes", self.block_volumes),
            ("Pending", self.pending_ops),
        ]
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, count) in self.rows() {
            if count.pending != 0 {
                writeln!(f, "{:>16}: {:5}  ({} pending)", title, count.total, count.pending)?;
            } else {
                writeln!(f, "{:>16}: {:5}", title, count.total)?;
            }
        }
        Ok(())
    }
}

/// The complete result of one verifier run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Entity census per type.
    pub summary: Summary,
    /// Per-type violation counts.
    pub tally: Tally,
    /// Issues in the order found.
    pub issues: Vec<Issue>,
    /// True when no issues were found; drives the exit status.
    pub success: bool,
}

impl RunReport {
    /// Combines the census with the checker's outcome.
    pub fn new(summary: Summary, outcome: CheckOutcome) -> Self {
        RunReport {
            summary,
            tally: outcome.tally,
            issues: outcome.issues,
            success: outcome.success,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        writeln!(f)?;
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

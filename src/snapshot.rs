//! Snapshot loading.
//!
//! A snapshot is the full database export: seven collections, each a mapping
//! from identifier to entity record. The export is read once, held immutably
//! for the run, and never written back.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::model::{BlockVolume, Brick, Cluster, Device, Node, PendingOperation, Volume};

/// An in-memory database export.
///
/// Collections are `BTreeMap`s keyed by identifier, so entities within a
/// type are always visited in lexicographic identifier order regardless of
/// how the document was serialized. A collection missing from the document
/// loads as empty; partial exports stay checkable. Unknown top-level keys
/// (for example `dbattributeentries`) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    /// Clusters keyed by identifier.
    #[serde(rename = "clusterentries", default)]
    pub clusters: BTreeMap<String, Cluster>,
    /// Nodes keyed by identifier.
    #[serde(rename = "nodeentries", default)]
    pub nodes: BTreeMap<String, Node>,
    /// Devices keyed by identifier.
    #[serde(rename = "deviceentries", default)]
    pub devices: BTreeMap<String, Device>,
    /// Bricks keyed by identifier.
    #[serde(rename = "brickentries", default)]
    pub bricks: BTreeMap<String, Brick>,
    /// Volumes keyed by identifier.
    #[serde(rename = "volumeentries", default)]
    pub volumes: BTreeMap<String, Volume>,
    /// Block volumes keyed by identifier.
    #[serde(rename = "blockvolumeentries", default)]
    pub block_volumes: BTreeMap<String, BlockVolume>,
    /// Pending operations keyed by identifier.
    #[serde(rename = "pendingoperations", default)]
    pub pending_operations: BTreeMap<String, PendingOperation>,
}

impl Snapshot {
    /// Loads a snapshot from a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Loads a snapshot from any reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        debug!(
            clusters = snapshot.clusters.len(),
            nodes = snapshot.nodes.len(),
            devices = snapshot.devices.len(),
            bricks = snapshot.bricks.len(),
            volumes = snapshot.volumes.len(),
            block_volumes = snapshot.block_volumes.len(),
            pending_operations = snapshot.pending_operations.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Loads a snapshot from bytes already in memory.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

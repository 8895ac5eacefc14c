//! Entity records as they appear in a database export.
//!
//! Every identifier field here is a non-owning reference: an opaque string
//! that must be resolved by a collection lookup at check time. Field names
//! mirror the export document; absent fields deserialize to their defaults so
//! that a field-level gap shows up as a check finding rather than a load
//! failure.

use serde::Deserialize;

/// Aggregate storage capacity of a device, in kilobytes.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StorageSize {
    /// Total capacity of the device.
    #[serde(default)]
    pub total: u64,
    /// Capacity not yet allocated to bricks.
    #[serde(default)]
    pub free: u64,
    /// Capacity consumed by brick payloads and thin-pool metadata.
    #[serde(default)]
    pub used: u64,
}

/// In-flight operation marker carried by mutable entities.
///
/// An empty id means the entity has no operation in flight.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingMarker {
    /// Identifier of the pending operation, or empty.
    #[serde(rename = "Id", default)]
    pub id: String,
}

impl PendingMarker {
    /// Whether the marker names an operation.
    pub fn is_pending(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Identity payload of a cluster record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterInfo {
    /// Self identifier; must equal the collection key.
    #[serde(default)]
    pub id: String,
    /// Member node identifiers.
    #[serde(default)]
    pub nodes: Vec<String>,
    /// Volumes created in this cluster.
    #[serde(default)]
    pub volumes: Vec<String>,
    /// Block volumes created in this cluster.
    #[serde(default)]
    pub blockvolumes: Vec<String>,
    /// Whether block storage is enabled.
    #[serde(default)]
    pub block: bool,
    /// Whether file storage is enabled.
    #[serde(default)]
    pub file: bool,
}

/// A cluster of storage nodes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cluster {
    /// Identity payload.
    #[serde(rename = "Info", default)]
    pub info: ClusterInfo,
}

/// Identity payload of a node record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeInfo {
    /// Self identifier; must equal the collection key.
    #[serde(default)]
    pub id: String,
    /// Owning cluster.
    #[serde(default)]
    pub cluster: String,
    /// Failure zone the node is placed in.
    #[serde(default)]
    pub zone: u64,
}

/// A storage node registered in a cluster.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    /// Administrative state (`online` / `offline`).
    #[serde(rename = "State", default)]
    pub state: String,
    /// Identity payload.
    #[serde(rename = "Info", default)]
    pub info: NodeInfo,
    /// Devices registered under this node.
    #[serde(rename = "Devices", default)]
    pub devices: Vec<String>,
}

/// Identity payload of a device record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceInfo {
    /// Self identifier; must equal the collection key.
    #[serde(default)]
    pub id: String,
    /// Device path on the node, e.g. `/dev/sdb`.
    #[serde(default)]
    pub name: String,
    /// Capacity accounting for the device.
    #[serde(default)]
    pub storage: StorageSize,
}

/// A storage device registered under a node, subdivided into bricks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Device {
    /// Administrative state (`online` / `offline`).
    #[serde(rename = "State", default)]
    pub state: String,
    /// Identity payload.
    #[serde(rename = "Info", default)]
    pub info: DeviceInfo,
    /// Bricks carved from this device.
    #[serde(rename = "Bricks", default)]
    pub bricks: Vec<String>,
    /// Owning node.
    #[serde(rename = "NodeId", default)]
    pub node_id: String,
    /// Allocation extent size, in kilobytes.
    #[serde(rename = "ExtentSize", default)]
    pub extent_size: u64,
    /// In-flight operation marker.
    #[serde(rename = "Pending", default)]
    pub pending: PendingMarker,
}

/// Identity payload of a brick record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrickInfo {
    /// Self identifier; must equal the collection key.
    #[serde(default)]
    pub id: String,
    /// Device the brick is carved from.
    #[serde(default)]
    pub device: String,
    /// Node hosting the device.
    #[serde(default)]
    pub node: String,
    /// Volume the brick belongs to.
    #[serde(default)]
    pub volume: String,
    /// Brick size, in kilobytes.
    #[serde(default)]
    pub size: u64,
}

/// An allocated extent on a device, the smallest unit contributed to a volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Brick {
    /// Identity payload.
    #[serde(rename = "Info", default)]
    pub info: BrickInfo,
    /// Thin-pool payload size, in kilobytes.
    #[serde(rename = "TpSize", default)]
    pub tp_size: u64,
    /// Thin-pool metadata size, in kilobytes.
    #[serde(rename = "PoolMetadataSize", default)]
    pub pool_metadata_size: u64,
    /// In-flight operation marker.
    #[serde(rename = "Pending", default)]
    pub pending: PendingMarker,
}

/// Block-hosting bookkeeping carried by a volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockInfo {
    /// Space still available for new block volumes, in gigabytes.
    #[serde(default)]
    pub freesize: u64,
    /// Space withheld from block-volume placement, in gigabytes.
    #[serde(default)]
    pub reservedsize: u64,
    /// Block volumes hosted inside this volume.
    #[serde(rename = "blockvolume", default)]
    pub blockvolume: Vec<String>,
}

/// Identity payload of a volume record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeInfo {
    /// Self identifier; must equal the collection key.
    #[serde(default)]
    pub id: String,
    /// Human-facing volume name.
    #[serde(default)]
    pub name: String,
    /// Owning cluster.
    #[serde(default)]
    pub cluster: String,
    /// Volume size, in gigabytes.
    #[serde(default)]
    pub size: u64,
    /// Whether the volume hosts block volumes.
    #[serde(default)]
    pub block: bool,
    /// Block-hosting bookkeeping.
    #[serde(default)]
    pub blockinfo: BlockInfo,
}

/// A file-storage volume composed of bricks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Volume {
    /// Identity payload.
    #[serde(rename = "Info", default)]
    pub info: VolumeInfo,
    /// Bricks the volume is built from, in placement order.
    #[serde(rename = "Bricks", default)]
    pub bricks: Vec<String>,
    /// In-flight operation marker.
    #[serde(rename = "Pending", default)]
    pub pending: PendingMarker,
}

/// Identity payload of a block-volume record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockVolumeInfo {
    /// Self identifier; must equal the collection key.
    #[serde(default)]
    pub id: String,
    /// Owning cluster; may be empty on old exports.
    #[serde(default)]
    pub cluster: String,
    /// Volume whose free space hosts this block volume.
    #[serde(rename = "blockhostingvolume", default)]
    pub blockhostingvolume: String,
    /// Block-volume size, in gigabytes.
    #[serde(default)]
    pub size: u64,
}

/// A block-storage unit carved out of a hosting volume.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockVolume {
    /// Identity payload.
    #[serde(rename = "Info", default)]
    pub info: BlockVolumeInfo,
    /// In-flight operation marker.
    #[serde(rename = "Pending", default)]
    pub pending: PendingMarker,
}

/// One step of a pending operation, touching a single target entity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingAction {
    /// Numeric change-kind code as written by the control plane.
    #[serde(rename = "Change", default)]
    pub change: i64,
    /// Identifier of the entity the action touches.
    #[serde(rename = "Id", default)]
    pub id: String,
    /// Size delta for expand actions, in gigabytes.
    #[serde(rename = "Delta", default)]
    pub delta: u64,
}

/// A record of an in-flight multi-step mutation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingOperation {
    /// Self identifier; must equal the collection key.
    #[serde(rename = "Id", default)]
    pub id: String,
    /// Unix timestamp of when the operation was recorded.
    #[serde(rename = "Timestamp", default)]
    pub timestamp: i64,
    /// Ordered steps of the operation.
    #[serde(rename = "Actions", default)]
    pub actions: Vec<PendingAction>,
    /// Lifecycle status (empty for new, `stale`, `failed`).
    #[serde(rename = "Status", default)]
    pub status: String,
}

/// The collection an action's target identifier must resolve into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCollection {
    /// The brick collection.
    Bricks,
    /// The volume collection.
    Volumes,
    /// The block-volume collection.
    BlockVolumes,
    /// The device collection.
    Devices,
}

impl TargetCollection {
    /// Name used when reporting a dangling action target.
    pub fn name(self) -> &'static str {
        match self {
            TargetCollection::Bricks => "bricks",
            TargetCollection::Volumes => "volumes",
            TargetCollection::BlockVolumes => "blockvolumes",
            TargetCollection::Devices => "devices",
        }
    }
}

/// Mutation category a [`PendingAction`] represents.
///
/// The numeric wire codes are part of the export format and cannot change.
/// A code outside this table is a violation, not a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Brick being added to a volume.
    AddBrick,
    /// Volume being created.
    AddVolume,
    /// Brick being removed from a volume.
    DeleteBrick,
    /// Volume being deleted.
    DeleteVolume,
    /// Volume being grown in place.
    ExpandVolume,
    /// Block volume being created.
    AddBlockVolume,
    /// Block volume being deleted.
    DeleteBlockVolume,
    /// Device being drained and removed.
    RemoveDevice,
    /// Volume being cloned.
    CloneVolume,
    /// Snapshot being taken of a volume.
    SnapshotVolume,
    /// Clone being attached to a volume.
    AddVolumeClone,
}

impl ChangeKind {
    /// Decodes a wire code, or `None` for an unrecognized one.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ChangeKind::AddBrick),
            2 => Some(ChangeKind::AddVolume),
            3 => Some(ChangeKind::DeleteBrick),
            4 => Some(ChangeKind::DeleteVolume),
            5 => Some(ChangeKind::ExpandVolume),
            6 => Some(ChangeKind::AddBlockVolume),
            7 => Some(ChangeKind::DeleteBlockVolume),
            8 => Some(ChangeKind::RemoveDevice),
            9 => Some(ChangeKind::CloneVolume),
            10 => Some(ChangeKind::SnapshotVolume),
            11 => Some(ChangeKind::AddVolumeClone),
            _ => None,
        }
    }

    /// The collection an action of this kind targets.
    pub fn target(self) -> TargetCollection {
        match self {
            ChangeKind::AddBrick | ChangeKind::DeleteBrick => TargetCollection::Bricks,
            ChangeKind::AddVolume
            | ChangeKind::DeleteVolume
            | ChangeKind::ExpandVolume
            | ChangeKind::CloneVolume
            | ChangeKind::SnapshotVolume
            | ChangeKind::AddVolumeClone => TargetCollection::Volumes,
            ChangeKind::AddBlockVolume | ChangeKind::DeleteBlockVolume => {
                TargetCollection::BlockVolumes
            }
            ChangeKind::RemoveDevice => TargetCollection::Devices,
        }
    }
}

//! The integrity check battery.
//!
//! One independent pass per entity type, in a fixed order: cluster, volume,
//! block volume, device, brick, pending operation, node. No pass depends on
//! another's findings and no finding stops the run, so a single pass over a
//! damaged snapshot surfaces the complete issue set. Entities within a type
//! are visited in identifier order (see [`Snapshot`]), which makes the issue
//! stream reproducible for a given snapshot.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::model::{ChangeKind, PendingMarker, TargetCollection};
use crate::snapshot::Snapshot;

/// The entity categories a finding can be attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A cluster record.
    Cluster,
    /// A volume record.
    Volume,
    /// A block-volume record.
    BlockVolume,
    /// A device record.
    Device,
    /// A brick record.
    Brick,
    /// A pending-operation record.
    PendingOp,
    /// A node record.
    Node,
}

impl EntityType {
    /// Label used in issue lines.
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Cluster => "Cluster",
            EntityType::Volume => "Volume",
            EntityType::BlockVolume => "Block Volume",
            EntityType::Device => "Device",
            EntityType::Brick => "Brick",
            EntityType::PendingOp => "Pending Op",
            EntityType::Node => "Node",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single violation found by a check pass.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    /// Type of the entity the finding is attributed to.
    pub entity_type: EntityType,
    /// Collection key of that entity.
    pub entity_id: String,
    /// What is wrong.
    pub message: String,
    /// Offending identifiers or totals, when the message alone is not enough.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.entity_type, self.entity_id, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Per-run, per-type violation counts.
///
/// Accumulated alongside the issue stream instead of in process-global
/// state, so the battery can run repeatedly within one process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    /// Violations attributed to clusters.
    pub clusters: u64,
    /// Violations attributed to volumes.
    pub volumes: u64,
    /// Violations attributed to block volumes.
    pub block_volumes: u64,
    /// Violations attributed to devices.
    pub devices: u64,
    /// Violations attributed to bricks.
    pub bricks: u64,
    /// Violations attributed to pending operations.
    pub pending_ops: u64,
    /// Violations attributed to nodes.
    pub nodes: u64,
}

impl Tally {
    fn bump(&mut self, entity_type: EntityType) {
        match entity_type {
            EntityType::Cluster => self.clusters += 1,
            EntityType::Volume => self.volumes += 1,
            EntityType::BlockVolume => self.block_volumes += 1,
            EntityType::Device => self.devices += 1,
            EntityType::Brick => self.bricks += 1,
            EntityType::PendingOp => self.pending_ops += 1,
            EntityType::Node => self.nodes += 1,
        }
    }

    /// Violations recorded against the given entity type.
    pub fn get(self, entity_type: EntityType) -> u64 {
        match entity_type {
            EntityType::Cluster => self.clusters,
            EntityType::Volume => self.volumes,
            EntityType::BlockVolume => self.block_volumes,
            EntityType::Device => self.devices,
            EntityType::Brick => self.bricks,
            EntityType::PendingOp => self.pending_ops,
            EntityType::Node => self.nodes,
        }
    }

    /// Total violations across all types.
    pub fn total(self) -> u64 {
        self.clusters
            + self.volumes
            + self.block_volumes
            + self.devices
            + self.bricks
            + self.pending_ops
            + self.nodes
    }
}

/// Everything the battery produces: the ordered issue stream and tallies.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    /// True when the issue stream is empty.
    pub success: bool,
    /// Per-type violation counts.
    pub tally: Tally,
    /// Issues in the order found.
    pub issues: Vec<Issue>,
}

/// Runs the full battery over a loaded snapshot.
pub fn check_snapshot(snapshot: &Snapshot) -> CheckOutcome {
    let mut checker = Checker {
        snap: snapshot,
        issues: Vec::new(),
        tally: Tally::default(),
    };
    checker.check_clusters();
    checker.check_volumes();
    checker.check_block_volumes();
    checker.check_devices();
    checker.check_bricks();
    checker.check_pending_ops();
    checker.check_nodes();
    debug!(issues = checker.issues.len(), "check battery complete");
    CheckOutcome {
        success: checker.issues.is_empty(),
        tally: checker.tally,
        issues: checker.issues,
    }
}

struct Checker<'a> {
    snap: &'a Snapshot,
    issues: Vec<Issue>,
    tally: Tally,
}

impl Checker<'_> {
    fn report(&mut self, entity_type: EntityType, entity_id: &str, message: &str) {
        self.report_detail(entity_type, entity_id, message, None);
    }

    fn report_detail(
        &mut self,
        entity_type: EntityType,
        entity_id: &str,
        message: &str,
        detail: Option<String>,
    ) {
        self.tally.bump(entity_type);
        self.issues.push(Issue {
            entity_type,
            entity_id: entity_id.to_string(),
            message: message.to_string(),
            detail,
        });
    }

    /// Emits one issue per list when any identifier repeats, with the
    /// repeated identifiers as the detail.
    fn check_duplicates(
        &mut self,
        entity_type: EntityType,
        entity_id: &str,
        list: &[String],
        noun: &str,
    ) {
        let dups = duplicate_ids(list);
        if !dups.is_empty() {
            self.report_detail(
                entity_type,
                entity_id,
                &format!("duplicate ids in {noun} list"),
                Some(dups.join(", ")),
            );
        }
    }

    fn check_pending_marker(
        &mut self,
        entity_type: EntityType,
        entity_id: &str,
        pending: &PendingMarker,
    ) {
        if !pending.is_pending() {
            return;
        }
        if !self.snap.pending_operations.contains_key(&pending.id) {
            self.report_detail(
                entity_type,
                entity_id,
                "marked pending but no pending op",
                Some(pending.id.clone()),
            );
        }
    }

    fn check_clusters(&mut self) {
        let snap = self.snap;
        for (cid, cluster) in &snap.clusters {
            let info = &cluster.info;
            if info.id != *cid {
                self.report_detail(EntityType::Cluster, cid, "id mismatch", Some(info.id.clone()));
            }
            for nid in &info.nodes {
                if !snap.nodes.contains_key(nid) {
                    self.report_detail(EntityType::Cluster, cid, "unknown node", Some(nid.clone()));
                }
            }
            for vid in &info.volumes {
                if !snap.volumes.contains_key(vid) {
                    self.report_detail(
                        EntityType::Cluster,
                        cid,
                        "unknown volume",
                        Some(vid.clone()),
                    );
                }
            }
            for bvid in &info.blockvolumes {
                if !snap.block_volumes.contains_key(bvid) {
                    self.report_detail(
                        EntityType::Cluster,
                        cid,
                        "unknown block volume",
                        Some(bvid.clone()),
                    );
                }
            }
            self.check_duplicates(EntityType::Cluster, cid, &info.nodes, "node");
            self.check_duplicates(EntityType::Cluster, cid, &info.volumes, "volume");
            self.check_duplicates(EntityType::Cluster, cid, &info.blockvolumes, "blockvolume");
        }
    }

    fn check_volumes(&mut self) {
        let snap = self.snap;
        for (vid, volume) in &snap.volumes {
            let info = &volume.info;
            if info.id != *vid {
                self.report_detail(EntityType::Volume, vid, "id mismatch", Some(info.id.clone()));
            }
            for bid in &volume.bricks {
                if !snap.bricks.contains_key(bid) {
                    self.report_detail(EntityType::Volume, vid, "unknown brick", Some(bid.clone()));
                }
            }

            // Sum hosted block volumes once each; the duplicate scan below
            // owns reporting repeats.
            let mut hosted_size: i64 = 0;
            let mut summed: BTreeSet<&str> = BTreeSet::new();
            for bvid in &info.blockinfo.blockvolume {
                if !summed.insert(bvid.as_str()) {
                    continue;
                }
                match snap.block_volumes.get(bvid) {
                    Some(block_volume) => hosted_size += block_volume.info.size as i64,
                    None => self.report_detail(
                        EntityType::Volume,
                        vid,
                        "unknown block volume",
                        Some(bvid.clone()),
                    ),
                }
            }
            if info.block {
                let used_size = info.size as i64
                    - info.blockinfo.freesize as i64
                    - info.blockinfo.reservedsize as i64;
                if hosted_size != used_size {
                    self.report_detail(
                        EntityType::Volume,
                        vid,
                        "block size differs",
                        Some(format!(
                            "calculated-size={} size={} free-size={} reserved-size={} used-size={}",
                            hosted_size,
                            info.size,
                            info.blockinfo.freesize,
                            info.blockinfo.reservedsize,
                            used_size
                        )),
                    );
                }
            } else if hosted_size != 0 {
                self.report(EntityType::Volume, vid, "has block volumes but not block flag");
            }

            match snap.clusters.get(&info.cluster) {
                None => self.report_detail(
                    EntityType::Volume,
                    vid,
                    "cluster mismatch",
                    Some(info.cluster.clone()),
                ),
                Some(cluster) if !cluster.info.volumes.contains(vid) => self.report_detail(
                    EntityType::Volume,
                    vid,
                    "no link back to volume for cluster",
                    Some(info.cluster.clone()),
                ),
                Some(_) => {}
            }
            self.check_duplicates(
                EntityType::Volume,
                vid,
                &info.blockinfo.blockvolume,
                "blockvolume",
            );
            self.check_pending_marker(EntityType::Volume, vid, &volume.pending);
        }
    }

    fn check_block_volumes(&mut self) {
        let snap = self.snap;
        for (bvid, block_volume) in &snap.block_volumes {
            let info = &block_volume.info;
            if info.id != *bvid {
                self.report_detail(
                    EntityType::BlockVolume,
                    bvid,
                    "id mismatch",
                    Some(info.id.clone()),
                );
            }
            if !info.cluster.is_empty() {
                match snap.clusters.get(&info.cluster) {
                    None => self.report_detail(
                        EntityType::BlockVolume,
                        bvid,
                        "cluster not found",
                        Some(info.cluster.clone()),
                    ),
                    Some(cluster) if !cluster.info.blockvolumes.contains(bvid) => self
                        .report_detail(
                            EntityType::BlockVolume,
                            bvid,
                            "no link back to block volume for cluster",
                            Some(info.cluster.clone()),
                        ),
                    Some(_) => {}
                }
            }
            match snap.volumes.get(&info.blockhostingvolume) {
                None => self.report_detail(
                    EntityType::BlockVolume,
                    bvid,
                    "hosting volume not found",
                    Some(info.blockhostingvolume.clone()),
                ),
                Some(volume) if !volume.info.blockinfo.blockvolume.contains(bvid) => self
                    .report_detail(
                        EntityType::BlockVolume,
                        bvid,
                        "no link back to block volume for volume",
                        Some(info.blockhostingvolume.clone()),
                    ),
                Some(_) => {}
            }
            self.check_pending_marker(EntityType::BlockVolume, bvid, &block_volume.pending);
        }
    }

    fn check_devices(&mut self) {
        let snap = self.snap;
        for (did, device) in &snap.devices {
            let info = &device.info;
            if info.id != *did {
                self.report_detail(EntityType::Device, did, "id mismatch", Some(info.id.clone()));
            }
            for bid in &device.bricks {
                if !snap.bricks.contains_key(bid) {
                    self.report_detail(EntityType::Device, did, "unknown brick", Some(bid.clone()));
                }
            }
            self.check_duplicates(EntityType::Device, did, &device.bricks, "brick");

            // The capacity walk revalidates the brick list it sums over, so a
            // duplicated entry surfaces here as well as in the link check
            // above. Repeats are summed once to keep the two size checks
            // meaningful on their own.
            let mut brick_sum: u64 = 0;
            let mut walked: BTreeSet<&str> = BTreeSet::new();
            let mut repeats: BTreeSet<&str> = BTreeSet::new();
            for bid in &device.bricks {
                if !walked.insert(bid.as_str()) {
                    repeats.insert(bid.as_str());
                    continue;
                }
                if let Some(brick) = snap.bricks.get(bid) {
                    brick_sum += brick.tp_size + brick.pool_metadata_size;
                }
            }
            if !repeats.is_empty() {
                let joined = repeats.into_iter().collect::<Vec<_>>().join(", ");
                self.report_detail(
                    EntityType::Device,
                    did,
                    "duplicate ids in brick list",
                    Some(joined),
                );
            }
            let storage = &info.storage;
            if storage.total != storage.free + storage.used {
                self.report_detail(
                    EntityType::Device,
                    did,
                    "size values differ",
                    Some(format!(
                        "total={} free={} used={}",
                        storage.total, storage.free, storage.used
                    )),
                );
            }
            if storage.used != brick_sum {
                self.report_detail(
                    EntityType::Device,
                    did,
                    "size values differ",
                    Some(format!("used={} brick-sum={}", storage.used, brick_sum)),
                );
            }

            match snap.nodes.get(&device.node_id) {
                None => self.report_detail(
                    EntityType::Device,
                    did,
                    "node mismatch",
                    Some(device.node_id.clone()),
                ),
                Some(node) if !node.devices.contains(did) => self.report_detail(
                    EntityType::Device,
                    did,
                    "no link back to device for node",
                    Some(device.node_id.clone()),
                ),
                Some(_) => {}
            }
            self.check_pending_marker(EntityType::Device, did, &device.pending);
        }
    }

    fn check_bricks(&mut self) {
        let snap = self.snap;
        for (bid, brick) in &snap.bricks {
            let info = &brick.info;
            if info.id != *bid {
                self.report_detail(EntityType::Brick, bid, "id mismatch", Some(info.id.clone()));
            }
            match snap.devices.get(&info.device) {
                None => self.report_detail(
                    EntityType::Brick,
                    bid,
                    "device mismatch",
                    Some(info.device.clone()),
                ),
                Some(device) if !device.bricks.contains(bid) => self.report_detail(
                    EntityType::Brick,
                    bid,
                    "no link back to brick for device",
                    Some(info.device.clone()),
                ),
                Some(_) => {}
            }
            match snap.volumes.get(&info.volume) {
                None => self.report_detail(
                    EntityType::Brick,
                    bid,
                    "volume mismatch",
                    Some(info.volume.clone()),
                ),
                Some(volume) if !volume.bricks.contains(bid) => self.report_detail(
                    EntityType::Brick,
                    bid,
                    "no link back to brick for volume",
                    Some(info.volume.clone()),
                ),
                Some(_) => {}
            }
            if !snap.nodes.contains_key(&info.node) {
                self.report_detail(EntityType::Brick, bid, "node mismatch", Some(info.node.clone()));
            }
            self.check_pending_marker(EntityType::Brick, bid, &brick.pending);
        }
    }

    fn check_pending_ops(&mut self) {
        let snap = self.snap;
        for (pid, op) in &snap.pending_operations {
            if op.id != *pid {
                self.report_detail(EntityType::PendingOp, pid, "id mismatch", Some(op.id.clone()));
            }
            for action in &op.actions {
                let Some(kind) = ChangeKind::from_code(action.change) else {
                    self.report_detail(
                        EntityType::PendingOp,
                        pid,
                        "unexpected change type",
                        Some(action.change.to_string()),
                    );
                    continue;
                };
                let target = kind.target();
                let exists = match target {
                    TargetCollection::Bricks => snap.bricks.contains_key(&action.id),
                    TargetCollection::Volumes => snap.volumes.contains_key(&action.id),
                    TargetCollection::BlockVolumes => snap.block_volumes.contains_key(&action.id),
                    TargetCollection::Devices => snap.devices.contains_key(&action.id),
                };
                if !exists {
                    self.report_detail(
                        EntityType::PendingOp,
                        pid,
                        "id in change missing",
                        Some(format!("{} not found in {}", action.id, target.name())),
                    );
                }
            }
        }
    }

    fn check_nodes(&mut self) {
        let snap = self.snap;
        for (nid, node) in &snap.nodes {
            let info = &node.info;
            if info.id != *nid {
                self.report_detail(EntityType::Node, nid, "id mismatch", Some(info.id.clone()));
            }
            match snap.clusters.get(&info.cluster) {
                None => self.report_detail(
                    EntityType::Node,
                    nid,
                    "cluster not found",
                    Some(info.cluster.clone()),
                ),
                Some(cluster) if !cluster.info.nodes.contains(nid) => self.report_detail(
                    EntityType::Node,
                    nid,
                    "no link back to node for cluster",
                    Some(info.cluster.clone()),
                ),
                Some(_) => {}
            }
            self.check_duplicates(EntityType::Node, nid, &node.devices, "device");
            for did in &node.devices {
                match snap.devices.get(did) {
                    None => self.report_detail(
                        EntityType::Node,
                        nid,
                        "unknown device",
                        Some(did.clone()),
                    ),
                    Some(device) if device.node_id != *nid => self.report_detail(
                        EntityType::Node,
                        nid,
                        "no link back to node for device",
                        Some(did.clone()),
                    ),
                    Some(_) => {}
                }
            }
        }
    }
}

/// The distinct identifiers that occur more than once, in sorted order.
fn duplicate_ids(list: &[String]) -> Vec<String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut dups: BTreeSet<&str> = BTreeSet::new();
    for entry in list {
        if !seen.insert(entry.as_str()) {
            dups.insert(entry.as_str());
        }
    }
    dups.into_iter().map(str::to_string).collect()
}

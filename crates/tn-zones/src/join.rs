//! Node → zone spatial join.
//!
//! Zone bounding boxes go into an R-tree; a point query returns the candidate
//! zones whose box covers the node, and each candidate gets an exact
//! `Contains` test.  Points on a polygon boundary or inside a hole are not
//! contained.  Where polygons overlap, the smallest `LocationID` wins, so a
//! node lands in at most one zone and the result does not depend on R-tree
//! traversal order.

use std::collections::BTreeMap;

use geo::{BoundingRect, Contains, Point};
use log::{info, warn};
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};

use tn_core::{GeoPoint, NodeIdx, ZoneId};

use crate::zones::Zone;

/// Max ids listed in a data-quality warning.
const REPORT_EXAMPLES: usize = 20;

type ZoneBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

// ── ZoneIndex ─────────────────────────────────────────────────────────────────

/// Spatial index over zone polygons.
pub struct ZoneIndex {
    zones: Vec<Zone>,
    tree:  RTree<ZoneBox>,
}

impl ZoneIndex {
    pub fn new(zones: Vec<Zone>) -> Self {
        let boxes: Vec<ZoneBox> = zones
            .iter()
            .enumerate()
            .filter_map(|(i, zone)| {
                let rect = zone.polygon.bounding_rect()?;
                let (min, max) = (rect.min(), rect.max());
                Some(GeomWithData::new(Rectangle::from_corners([min.x, min.y], [max.x, max.y]), i))
            })
            .collect();
        Self { zones, tree: RTree::bulk_load(boxes) }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Zone containing `pos`, if any.
    pub fn locate(&self, pos: GeoPoint) -> Option<ZoneId> {
        let point = Point::new(pos.lon, pos.lat);
        self.tree
            .locate_all_at_point(&[pos.lon, pos.lat])
            .map(|entry| &self.zones[entry.data])
            .filter(|zone| zone.polygon.contains(&point))
            .map(|zone| zone.id)
            .min()
    }
}

// ── NodeZoneTable ─────────────────────────────────────────────────────────────

/// Dense node indices grouped by the zone containing them.
///
/// Only zones with at least one node have an entry; nodes within a zone are
/// in the order they were joined (ascending `NodeIdx` for a node table).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeZoneTable {
    zones: BTreeMap<ZoneId, Vec<NodeIdx>>,
}

impl NodeZoneTable {
    /// Nodes inside `zone`, or `None` if the zone received no nodes.
    pub fn nodes_in(&self, zone: ZoneId) -> Option<&[NodeIdx]> {
        self.zones.get(&zone).map(Vec::as_slice)
    }

    pub fn contains_zone(&self, zone: ZoneId) -> bool {
        self.zones.contains_key(&zone)
    }

    /// Number of zones with at least one node.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Number of nodes assigned to some zone.
    pub fn node_count(&self) -> usize {
        self.zones.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &[NodeIdx])> {
        self.zones.iter().map(|(&z, nodes)| (z, nodes.as_slice()))
    }
}

impl FromIterator<(ZoneId, NodeIdx)> for NodeZoneTable {
    fn from_iter<I: IntoIterator<Item = (ZoneId, NodeIdx)>>(iter: I) -> Self {
        let mut zones: BTreeMap<ZoneId, Vec<NodeIdx>> = BTreeMap::new();
        for (zone, node) in iter {
            zones.entry(zone).or_default().push(node);
        }
        Self { zones }
    }
}

// ── JoinReport ────────────────────────────────────────────────────────────────

/// Data-quality summary of a join.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinReport {
    pub nodes_total: usize,
    /// Nodes outside every zone, ascending.
    pub unassigned:  Vec<NodeIdx>,
    /// Zone ids present in the polygon file that received no node, ascending.
    pub empty_zones: Vec<ZoneId>,
}

impl JoinReport {
    pub fn nodes_assigned(&self) -> usize {
        self.nodes_total - self.unassigned.len()
    }

    /// Log the unassigned nodes and empty zones at `warn`.
    pub fn log_warnings(&self) {
        if !self.unassigned.is_empty() {
            warn!(
                "{} of {} nodes fall outside every zone, e.g. {:?}",
                self.unassigned.len(),
                self.nodes_total,
                &self.unassigned[..self.unassigned.len().min(REPORT_EXAMPLES)],
            );
        }
        if !self.empty_zones.is_empty() {
            warn!(
                "{} zones contain no node; their trips will be dropped, e.g. {:?}",
                self.empty_zones.len(),
                &self.empty_zones[..self.empty_zones.len().min(REPORT_EXAMPLES)],
            );
        }
    }
}

// ── Join ──────────────────────────────────────────────────────────────────────

/// Assign every node to the zone containing it.
pub fn assign_nodes<I>(index: &ZoneIndex, nodes: I) -> (NodeZoneTable, JoinReport)
where
    I: IntoIterator<Item = (NodeIdx, GeoPoint)>,
{
    let mut nodes_total = 0;
    let mut unassigned = Vec::new();
    let mut pairs = Vec::new();

    for (idx, pos) in nodes {
        nodes_total += 1;
        match index.locate(pos) {
            Some(zone) => pairs.push((zone, idx)),
            None => unassigned.push(idx),
        }
    }

    let table: NodeZoneTable = pairs.into_iter().collect();

    let mut empty_zones: Vec<ZoneId> = index
        .zones()
        .iter()
        .map(|z| z.id)
        .filter(|id| !table.contains_zone(*id))
        .collect();
    empty_zones.sort_unstable();
    empty_zones.dedup();
    unassigned.sort_unstable();

    info!(
        "zone join: {} of {} nodes in {} zones",
        nodes_total - unassigned.len(),
        nodes_total,
        table.zone_count(),
    );

    (table, JoinReport { nodes_total, unassigned, empty_zones })
}

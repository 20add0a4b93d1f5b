//! In-memory road store.
//!
//! Rows live in insertion order in plain `Vec`s.  Two R-trees (via `rstar`)
//! index road bounding rectangles and intersection points in `[x, y]` store
//! coordinates; bounding-box queries return rows in insertion order.

use geo::Rect;
use rstar::{RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use olr_geo::Crs;

use crate::store::{IntersectionRow, RoadRow, RoadStore};
use crate::MapResult;

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Envelope of one stored row plus its position in the row `Vec`.
#[derive(Clone)]
struct RowEntry {
    envelope: AABB<[f64; 2]>,
    index:    usize,
}

impl RTreeObject for RowEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn aabb(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// A [`RoadStore`] held entirely in memory.  Build with [`MemoryStoreBuilder`].
pub struct MemoryStore {
    roads:         Vec<RoadRow>,
    intersections: Vec<IntersectionRow>,
    road_by_id:    FxHashMap<String, usize>,
    node_by_id:    FxHashMap<String, usize>,
    /// Road indices touching each intersection id, ascending.
    roads_by_node: FxHashMap<String, Vec<usize>>,
    road_idx:      RTree<RowEntry>,
    node_idx:      RTree<RowEntry>,
    crs:           Crs,
}

impl MemoryStore {
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::new()
    }

    fn roads_at(&self, mut indices: Vec<usize>) -> Vec<RoadRow> {
        indices.sort_unstable();
        indices.into_iter().map(|i| self.roads[i].clone()).collect()
    }
}

impl RoadStore for MemoryStore {
    fn crs(&self) -> Crs {
        self.crs
    }

    fn road(&self, id: &str) -> MapResult<Option<RoadRow>> {
        Ok(self.road_by_id.get(id).map(|&i| self.roads[i].clone()))
    }

    fn roads(&self) -> MapResult<Vec<RoadRow>> {
        Ok(self.roads.clone())
    }

    fn roads_in_bbox(&self, rect: Rect<f64>) -> MapResult<Vec<RoadRow>> {
        let hits = self
            .road_idx
            .locate_in_envelope_intersecting(&aabb(rect))
            .map(|e| e.index)
            .collect();
        Ok(self.roads_at(hits))
    }

    fn roads_at_node(&self, node_id: &str) -> MapResult<Vec<RoadRow>> {
        Ok(self
            .roads_by_node
            .get(node_id)
            .map(|v| v.iter().map(|&i| self.roads[i].clone()).collect())
            .unwrap_or_default())
    }

    fn intersection(&self, id: &str) -> MapResult<Option<IntersectionRow>> {
        Ok(self.node_by_id.get(id).map(|&i| self.intersections[i].clone()))
    }

    fn intersections(&self) -> MapResult<Vec<IntersectionRow>> {
        Ok(self.intersections.clone())
    }

    fn intersections_in_bbox(&self, rect: Rect<f64>) -> MapResult<Vec<IntersectionRow>> {
        let mut hits: Vec<usize> = self
            .node_idx
            .locate_in_envelope_intersecting(&aabb(rect))
            .map(|e| e.index)
            .collect();
        hits.sort_unstable();
        Ok(hits.into_iter().map(|i| self.intersections[i].clone()).collect())
    }

    fn road_count(&self) -> MapResult<usize> {
        Ok(self.roads.len())
    }

    fn intersection_count(&self) -> MapResult<usize> {
        Ok(self.intersections.len())
    }

    fn extent(&self) -> MapResult<Option<Rect<f64>>> {
        if self.roads.is_empty() {
            return Ok(None);
        }
        let env = self.road_idx.root().envelope();
        Ok(Some(Rect::new(
            (env.lower()[0], env.lower()[1]),
            (env.upper()[0], env.upper()[1]),
        )))
    }
}

// ── MemoryStoreBuilder ────────────────────────────────────────────────────────

/// Collect rows, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use olr_core::{Coordinates, Fow, Frc};
/// use olr_map::{Direction, MemoryStoreBuilder, RoadRow, RoadStore};
///
/// let a = Coordinates::new(6.10, 49.60);
/// let b = Coordinates::new(6.11, 49.60);
/// let store = MemoryStoreBuilder::new()
///     .intersection("A", a)
///     .intersection("B", b)
///     .road(RoadRow {
///         id: "1".into(), fow: Fow::SingleCarriageway, frc: Frc::Frc3,
///         direction: Direction::Both, start_id: "A".into(), end_id: "B".into(),
///         length_m: 722.0, geometry: vec![a, b],
///     })
///     .build().unwrap();
/// assert_eq!(store.road_count().unwrap(), 1);
/// assert_eq!(store.directed_line_count().unwrap(), 2);
/// ```
#[derive(Default)]
pub struct MemoryStoreBuilder {
    roads:         Vec<RoadRow>,
    intersections: Vec<IntersectionRow>,
    crs:           Crs,
}

impl MemoryStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// CRS of the rows being added.  WGS84 unless set.
    pub fn crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    pub fn road(mut self, row: RoadRow) -> Self {
        self.roads.push(row);
        self
    }

    pub fn intersection(mut self, id: impl Into<String>, coord: olr_core::Coordinates) -> Self {
        self.intersections.push(IntersectionRow { id: id.into(), coord });
        self
    }

    /// Add rows in bulk, e.g. copied out of another store.
    pub fn extend(
        mut self,
        roads: impl IntoIterator<Item = RoadRow>,
        intersections: impl IntoIterator<Item = IntersectionRow>,
    ) -> Self {
        self.roads.extend(roads);
        self.intersections.extend(intersections);
        self
    }

    /// Drop every road with stored id `id`.
    pub fn without_road(mut self, id: &str) -> Self {
        self.roads.retain(|r| r.id != id);
        self
    }

    /// Apply `f` to the road with stored id `id`, if present.
    pub fn modify_road(mut self, id: &str, f: impl FnOnce(&mut RoadRow)) -> Self {
        if let Some(row) = self.roads.iter_mut().find(|r| r.id == id) {
            f(row);
        }
        self
    }

    /// Index the rows and produce the store.  Later rows win on duplicate ids.
    ///
    /// Fails with [`MapError::InvalidRow`](crate::MapError::InvalidRow) on
    /// the first road that would not survive a round trip through SQLite.
    pub fn build(self) -> MapResult<MemoryStore> {
        for row in &self.roads {
            row.validate()?;
        }
        let mut road_by_id = FxHashMap::default();
        let mut roads_by_node: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut entries = Vec::with_capacity(self.roads.len());
        for (i, row) in self.roads.iter().enumerate() {
            road_by_id.insert(row.id.clone(), i);
            roads_by_node.entry(row.start_id.clone()).or_default().push(i);
            if row.end_id != row.start_id {
                roads_by_node.entry(row.end_id.clone()).or_default().push(i);
            }
            entries.push(RowEntry { envelope: aabb(row.bounding_rect()), index: i });
        }

        let mut node_by_id = FxHashMap::default();
        let node_entries: Vec<RowEntry> = self
            .intersections
            .iter()
            .enumerate()
            .map(|(i, n)| {
                node_by_id.insert(n.id.clone(), i);
                RowEntry { envelope: AABB::from_point([n.coord.lon, n.coord.lat]), index: i }
            })
            .collect();

        Ok(MemoryStore {
            road_idx: RTree::bulk_load(entries),
            node_idx: RTree::bulk_load(node_entries),
            roads: self.roads,
            intersections: self.intersections,
            road_by_id,
            node_by_id,
            roads_by_node,
            crs: self.crs,
        })
    }
}

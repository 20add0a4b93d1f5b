//! Unrestricted map adapter.

use geo::Rect;
use tracing::debug;

use olr_core::{Coordinates, LineIdx, NodeIdx};
use olr_geo::Crs;

use crate::arena::{virtualize, Arena, Line, Node};
use crate::reader::MapReader;
use crate::store::{RoadRow, RoadStore};
use crate::{MapError, MapResult};

/// A [`MapReader`] over every road in a [`RoadStore`].
///
/// Lines and nodes are materialized on first contact (proximity query,
/// traversal, endpoint resolution, or a full scan) and kept for the life of
/// the adapter.  Call [`clear_cache`](Self::clear_cache) between unrelated
/// decodes to bound memory.
pub struct FullMap<S: RoadStore> {
    store: S,
    arena: Arena,
}

impl<S: RoadStore> FullMap<S> {
    pub fn new(store: S) -> Self {
        Self { store, arena: Arena::new() }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Rectangle covering the whole stored map.
    pub fn extent(&self) -> MapResult<Option<Rect<f64>>> {
        self.store.extent()
    }

    /// Forget every materialized line and node.  Outstanding handles become
    /// invalid.
    pub fn clear_cache(&mut self) {
        self.arena = Arena::new();
    }

    /// Materialize the directed lines of `row`, returning their handles.
    pub(crate) fn materialize(&mut self, row: &RoadRow) -> Vec<LineIdx> {
        virtualize(row).into_iter().map(|l| self.arena.insert_line(l)).collect()
    }

    /// Look up a node by id, loading it from the store if needed.
    pub fn fetch_node(&mut self, id: &str) -> MapResult<NodeIdx> {
        if let Some(h) = self.arena.find_node(id) {
            return Ok(h);
        }
        let row = self
            .store
            .intersection(id)?
            .ok_or_else(|| MapError::NodeNotFound(id.to_string()))?;
        Ok(self.arena.insert_node(Node::new(row, true)))
    }

    /// Look up a line by id, loading its road from the store if needed.
    pub fn fetch_line(&mut self, id: &str) -> MapResult<LineIdx> {
        if let Some(h) = self.arena.find_line(id) {
            return Ok(h);
        }
        let road_id = id.strip_prefix('-').unwrap_or(id);
        if let Some(row) = self.store.road(road_id)? {
            self.materialize(&row);
        }
        self.arena.find_line(id).ok_or_else(|| MapError::LineNotFound(id.to_string()))
    }

    /// Load and cache the adjacency of `node` from the store.
    fn ensure_adjacency(&mut self, node: NodeIdx) -> MapResult<()> {
        if self.arena.node(node).outgoing.is_some() {
            return Ok(());
        }
        let node_id = self.arena.node(node).id.clone();
        let rows = self.store.roads_at_node(&node_id)?;
        let (mut outgoing, mut incoming) = (Vec::new(), Vec::new());
        for row in &rows {
            for h in self.materialize(row) {
                let line = self.arena.line(h);
                if line.start_id == node_id {
                    outgoing.push(h);
                }
                if line.end_id == node_id {
                    incoming.push(h);
                }
            }
        }
        let n = self.arena.node_mut(node);
        n.outgoing = Some(outgoing);
        n.incoming = Some(incoming);
        Ok(())
    }

    fn resolve_endpoint(&mut self, line: LineIdx, at_start: bool) -> MapResult<NodeIdx> {
        let l = self.arena.line(line);
        let cached = if at_start { l.start } else { l.end };
        if let Some(h) = cached {
            return Ok(h);
        }
        let id = if at_start { l.start_id.clone() } else { l.end_id.clone() };
        let h = self.fetch_node(&id)?;
        let l = self.arena.line_mut(line);
        if at_start { l.start = Some(h) } else { l.end = Some(h) }
        Ok(h)
    }
}

impl<S: RoadStore> MapReader for FullMap<S> {
    fn crs(&self) -> Crs {
        self.store.crs()
    }

    fn line(&self, h: LineIdx) -> &Line {
        self.arena.line(h)
    }

    fn node(&self, h: NodeIdx) -> &Node {
        self.arena.node(h)
    }

    fn get_line(&self, id: &str) -> MapResult<LineIdx> {
        self.arena.find_line(id).ok_or_else(|| MapError::LineNotFound(id.to_string()))
    }

    fn get_node(&self, id: &str) -> MapResult<NodeIdx> {
        self.arena.find_node(id).ok_or_else(|| MapError::NodeNotFound(id.to_string()))
    }

    fn get_lines(&mut self) -> MapResult<Vec<LineIdx>> {
        let rows = self.store.roads()?;
        Ok(rows.iter().flat_map(|row| self.materialize(row)).collect())
    }

    fn get_nodes(&mut self) -> MapResult<Vec<NodeIdx>> {
        let rows = self.store.intersections()?;
        Ok(rows.into_iter().map(|row| self.arena.insert_node(Node::new(row, true))).collect())
    }

    fn line_count(&self) -> MapResult<usize> {
        self.store.directed_line_count()
    }

    fn node_count(&self) -> MapResult<usize> {
        self.store.intersection_count()
    }

    fn find_lines_close_to(&mut self, coord: Coordinates, radius_m: f64) -> MapResult<Vec<LineIdx>> {
        let crs = self.store.crs();
        let rows = self.store.roads_in_bbox(crs.search_rect(coord, radius_m))?;
        let mut found = Vec::new();
        for row in &rows {
            // Both directions share a geometry, so one distance check covers them.
            if crs.distance_to_line(coord, &row.geometry) <= radius_m {
                found.extend(self.materialize(row));
            }
        }
        debug!(%coord, radius_m, prefiltered = rows.len(), found = found.len(), "lines close to");
        Ok(found)
    }

    fn find_nodes_close_to(&mut self, coord: Coordinates, radius_m: f64) -> MapResult<Vec<NodeIdx>> {
        let crs = self.store.crs();
        let rows = self.store.intersections_in_bbox(crs.search_rect(coord, radius_m))?;
        Ok(rows
            .into_iter()
            .filter(|row| crs.distance(coord, row.coord) <= radius_m)
            .map(|row| self.arena.insert_node(Node::new(row, true)))
            .collect())
    }

    fn outgoing_lines(&mut self, node: NodeIdx, exclude_peer_of: Option<LineIdx>) -> MapResult<Vec<LineIdx>> {
        self.ensure_adjacency(node)?;
        let cached = self.arena.node(node).outgoing.as_deref().unwrap_or_default();
        Ok(self.arena.without_peer(cached, exclude_peer_of))
    }

    fn incoming_lines(&mut self, node: NodeIdx, exclude_peer_of: Option<LineIdx>) -> MapResult<Vec<LineIdx>> {
        self.ensure_adjacency(node)?;
        let cached = self.arena.node(node).incoming.as_deref().unwrap_or_default();
        Ok(self.arena.without_peer(cached, exclude_peer_of))
    }

    fn start_node(&mut self, line: LineIdx) -> MapResult<NodeIdx> {
        self.resolve_endpoint(line, true)
    }

    fn end_node(&mut self, line: LineIdx) -> MapResult<NodeIdx> {
        self.resolve_endpoint(line, false)
    }
}

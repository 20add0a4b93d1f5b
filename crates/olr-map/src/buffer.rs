//! Map adapter restricted to a buffer polygon.
//!
//! At construction every road whose geometry touches the buffer is loaded
//! and split into lines.  Each line and node gets a `contained` flag, fixed
//! from then on.  Traversal only ever returns contained lines; proximity
//! queries do too, except around the first and last LRP of the reference
//! being decoded, where endpoints may legitimately snap just outside the
//! buffer.  For those two points candidate discovery is delegated to the
//! unrestricted map, so roads entirely outside the buffer can still be found.
//!
//! The buffer must be in the map's CRS.  The reference is given in WGS84 and
//! moved into that CRS on construction.

use rustc_hash::FxHashMap;
use tracing::debug;

use olr_core::{Coordinates, LineIdx, LineReference, NodeIdx};
use olr_geo::{Buffer, Crs};

use crate::arena::{Arena, Line, Node};
use crate::full::FullMap;
use crate::reader::MapReader;
use crate::store::{IntersectionRow, RoadStore};
use crate::{MapError, MapResult};

/// A [`MapReader`] that sees only what lies inside a [`Buffer`].
pub struct BufferMap<'a, S: RoadStore> {
    full:      &'a mut FullMap<S>,
    buffer:    &'a Buffer,
    reference: LineReference,
    arena:     Arena,
    by_start:  FxHashMap<String, Vec<LineIdx>>,
    by_end:    FxHashMap<String, Vec<LineIdx>>,
}

impl<'a, S: RoadStore> BufferMap<'a, S> {
    /// Load every road touching `buffer` from `full`'s store.
    ///
    /// `reference` is the WGS84 reference this adapter will decode; its first
    /// and last LRP coordinates are exempt from the visibility filter.
    pub fn new(full: &'a mut FullMap<S>, buffer: &'a Buffer, reference: LineReference) -> MapResult<Self> {
        let crs = full.crs();
        if buffer.crs() != crs {
            return Err(MapError::CrsMismatch { map: crs, buffer: buffer.crs() });
        }
        let reference = reference.map_coords(|c| crs.project(c));
        let mut map = Self {
            full,
            buffer,
            reference,
            arena: Arena::new(),
            by_start: FxHashMap::default(),
            by_end: FxHashMap::default(),
        };

        let rows = match buffer.bounding_rect() {
            Some(rect) => map.full.store().roads_in_bbox(rect)?,
            None => Vec::new(),
        };
        for row in rows.iter().filter(|r| buffer.intersects_line(&r.geometry)) {
            let contained = buffer.contains_line(&row.geometry);
            for mut line in crate::arena::virtualize(row) {
                line.contained = contained;
                map.import(line);
            }
        }
        debug!(
            roads = rows.len(),
            lines = map.arena.line_count(),
            nodes = map.arena.node_count(),
            "buffer map loaded"
        );
        Ok(map)
    }

    /// The reference being decoded, in the map CRS.
    pub fn reference(&self) -> &LineReference {
        &self.reference
    }

    pub fn buffer(&self) -> &Buffer {
        self.buffer
    }

    /// Add `line` and its endpoint nodes to the arena.  Nodes take their
    /// coordinates from the line geometry.
    fn import(&mut self, mut line: Line) -> LineIdx {
        if let Some(h) = self.arena.find_line(&line.id) {
            return h;
        }
        let start = self.import_node(&line.start_id, line.start_coord());
        let end = self.import_node(&line.end_id, line.end_coord());
        line.start = Some(start);
        line.end = Some(end);

        let (start_id, end_id) = (line.start_id.clone(), line.end_id.clone());
        let h = self.arena.insert_line(line);
        self.by_start.entry(start_id).or_default().push(h);
        self.by_end.entry(end_id).or_default().push(h);
        // Keep adjacency that was already handed out in sync.
        if let Some(out) = self.arena.node_mut(start).outgoing.as_mut() {
            out.push(h);
        }
        if let Some(inc) = self.arena.node_mut(end).incoming.as_mut() {
            inc.push(h);
        }
        h
    }

    fn import_node(&mut self, id: &str, coord: Coordinates) -> NodeIdx {
        if let Some(h) = self.arena.find_node(id) {
            return h;
        }
        let contained = self.buffer.contains_point(coord);
        self.arena.insert_node(Node::new(IntersectionRow { id: id.to_string(), coord }, contained))
    }

    /// Copy lines near a terminal LRP out of the unrestricted map.
    fn import_from_full(&mut self, coord: Coordinates, radius_m: f64) -> MapResult<()> {
        let found = self.full.find_lines_close_to(coord, radius_m)?;
        for h in found {
            if self.arena.find_line(&self.full.line(h).id).is_some() {
                continue;
            }
            let mut line = self.full.line(h).clone();
            line.contained = self.buffer.contains_line(&line.geometry);
            line.start = None;
            line.end = None;
            self.import(line);
        }
        Ok(())
    }

    fn ensure_adjacency(&mut self, node: NodeIdx) {
        if self.arena.node(node).outgoing.is_some() {
            return;
        }
        let id = &self.arena.node(node).id;
        let outgoing = self.by_start.get(id).cloned().unwrap_or_default();
        let incoming = self.by_end.get(id).cloned().unwrap_or_default();
        let n = self.arena.node_mut(node);
        n.outgoing = Some(outgoing);
        n.incoming = Some(incoming);
    }

    /// Contained lines from `lines`, minus the peer of `exclude_peer_of`.
    fn visible(&self, lines: &[LineIdx], exclude_peer_of: Option<LineIdx>) -> Vec<LineIdx> {
        let contained: Vec<LineIdx> =
            lines.iter().copied().filter(|&l| self.arena.line(l).contained).collect();
        self.arena.without_peer(&contained, exclude_peer_of)
    }
}

impl<S: RoadStore> MapReader for BufferMap<'_, S> {
    fn crs(&self) -> Crs {
        self.buffer.crs()
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
        Ok(self.arena.line_handles().filter(|&h| self.arena.line(h).contained).collect())
    }

    fn get_nodes(&mut self) -> MapResult<Vec<NodeIdx>> {
        Ok(self.arena.node_handles().filter(|&h| self.arena.node(h).contained).collect())
    }

    fn line_count(&self) -> MapResult<usize> {
        Ok(self.arena.line_handles().filter(|&h| self.arena.line(h).contained).count())
    }

    fn node_count(&self) -> MapResult<usize> {
        Ok(self.arena.node_handles().filter(|&h| self.arena.node(h).contained).count())
    }

    fn find_lines_close_to(&mut self, coord: Coordinates, radius_m: f64) -> MapResult<Vec<LineIdx>> {
        let terminal = self.reference.is_terminal_coord(coord);
        if terminal {
            self.import_from_full(coord, radius_m)?;
        }
        let crs = self.crs();
        Ok(self
            .arena
            .line_handles()
            .filter(|&h| {
                let line = self.arena.line(h);
                (terminal || line.contained) && crs.distance_to_line(coord, &line.geometry) <= radius_m
            })
            .collect())
    }

    fn find_nodes_close_to(&mut self, coord: Coordinates, radius_m: f64) -> MapResult<Vec<NodeIdx>> {
        let terminal = self.reference.is_terminal_coord(coord);
        if terminal {
            for h in self.full.find_nodes_close_to(coord, radius_m)? {
                let n = self.full.node(h);
                let (id, c) = (n.id.clone(), n.coord);
                self.import_node(&id, c);
            }
        }
        let crs = self.crs();
        Ok(self
            .arena
            .node_handles()
            .filter(|&h| {
                let node = self.arena.node(h);
                (terminal || node.contained) && crs.distance(coord, node.coord) <= radius_m
            })
            .collect())
    }

    fn outgoing_lines(&mut self, node: NodeIdx, exclude_peer_of: Option<LineIdx>) -> MapResult<Vec<LineIdx>> {
        self.ensure_adjacency(node);
        let cached = self.arena.node(node).outgoing.as_deref().unwrap_or_default();
        Ok(self.visible(cached, exclude_peer_of))
    }

    fn incoming_lines(&mut self, node: NodeIdx, exclude_peer_of: Option<LineIdx>) -> MapResult<Vec<LineIdx>> {
        self.ensure_adjacency(node);
        let cached = self.arena.node(node).incoming.as_deref().unwrap_or_default();
        Ok(self.visible(cached, exclude_peer_of))
    }

    fn start_node(&mut self, line: LineIdx) -> MapResult<NodeIdx> {
        let l = self.arena.line(line);
        l.start.ok_or_else(|| MapError::NodeNotFound(l.start_id.clone()))
    }

    fn end_node(&mut self, line: LineIdx) -> MapResult<NodeIdx> {
        let l = self.arena.line(line);
        l.end.ok_or_else(|| MapError::NodeNotFound(l.end_id.clone()))
    }
}

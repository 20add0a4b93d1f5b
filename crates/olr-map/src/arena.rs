//! Directed lines, nodes, and the arena that owns them.
//!
//! # Virtualization
//!
//! A stored road with direction `Both` becomes two lines: `id` along the
//! stored geometry and `"-" + id` against it (reversed geometry, swapped
//! endpoints).  `Forward` and `Reverse` roads become one line each.  The two
//! lines of a `Both` road are *peers*; peer-ness is decided by id alone.
//!
//! # Ownership
//!
//! An adapter owns one [`Arena`].  Lines refer to their endpoint nodes by id
//! until first resolved; after that the resolved [`NodeIdx`] is cached on
//! the line.  Nodes cache their adjacency the same way.  There are no
//! references between arena objects, only handles.

use rustc_hash::FxHashMap;

use olr_core::{Coordinates, Fow, Frc, LineIdx, NodeIdx};

use crate::store::{IntersectionRow, RoadRow};

// ── Line ──────────────────────────────────────────────────────────────────────

/// A one-way road segment as seen by a decoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub id:       String,
    pub fow:      Fow,
    pub frc:      Frc,
    pub length_m: f64,
    /// Ordered in driving direction.
    pub geometry: Vec<Coordinates>,
    pub start_id: String,
    pub end_id:   String,
    /// Visible to restricted traversal.  Always `true` in an unrestricted map.
    pub contained: bool,
    pub(crate) start: Option<NodeIdx>,
    pub(crate) end:   Option<NodeIdx>,
}

impl Line {
    /// First coordinate in driving direction.
    pub fn start_coord(&self) -> Coordinates {
        self.geometry[0]
    }

    pub fn end_coord(&self) -> Coordinates {
        self.geometry[self.geometry.len() - 1]
    }

    /// Id of the physical road, without the reverse-direction prefix.
    pub fn road_id(&self) -> &str {
        self.id.strip_prefix('-').unwrap_or(&self.id)
    }

    pub fn is_peer_of(&self, other: &Line) -> bool {
        are_peers(&self.id, &other.id)
    }
}

/// `true` when one id is `"-"` followed by the other.
pub fn are_peers(a: &str, b: &str) -> bool {
    a.strip_prefix('-') == Some(b) || b.strip_prefix('-') == Some(a)
}

/// Split a stored row into its directed lines, forward line first.
pub fn virtualize(row: &RoadRow) -> Vec<Line> {
    let mut lines = Vec::with_capacity(row.direction.line_count());
    if row.direction.has_forward() {
        lines.push(Line {
            id:        row.id.clone(),
            fow:       row.fow,
            frc:       row.frc,
            length_m:  row.length_m,
            geometry:  row.geometry.clone(),
            start_id:  row.start_id.clone(),
            end_id:    row.end_id.clone(),
            contained: true,
            start:     None,
            end:       None,
        });
    }
    if row.direction.has_reverse() {
        let mut geometry = row.geometry.clone();
        geometry.reverse();
        lines.push(Line {
            id:        format!("-{}", row.id),
            fow:       row.fow,
            frc:       row.frc,
            length_m:  row.length_m,
            geometry,
            start_id:  row.end_id.clone(),
            end_id:    row.start_id.clone(),
            contained: true,
            start:     None,
            end:       None,
        });
    }
    lines
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// An intersection.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id:        String,
    pub coord:     Coordinates,
    pub contained: bool,
    pub(crate) outgoing: Option<Vec<LineIdx>>,
    pub(crate) incoming: Option<Vec<LineIdx>>,
}

impl Node {
    pub fn new(row: IntersectionRow, contained: bool) -> Self {
        Self { id: row.id, coord: row.coord, contained, outgoing: None, incoming: None }
    }
}

// ── Arena ─────────────────────────────────────────────────────────────────────

/// Indexed storage for an adapter's lines and nodes.
#[derive(Default)]
pub struct Arena {
    lines:      Vec<Line>,
    nodes:      Vec<Node>,
    line_index: FxHashMap<String, LineIdx>,
    node_index: FxHashMap<String, NodeIdx>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn line(&self, h: LineIdx) -> &Line {
        &self.lines[h.index()]
    }

    #[inline]
    pub fn node(&self, h: NodeIdx) -> &Node {
        &self.nodes[h.index()]
    }

    #[inline]
    pub(crate) fn line_mut(&mut self, h: LineIdx) -> &mut Line {
        &mut self.lines[h.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, h: NodeIdx) -> &mut Node {
        &mut self.nodes[h.index()]
    }

    pub fn find_line(&self, id: &str) -> Option<LineIdx> {
        self.line_index.get(id).copied()
    }

    pub fn find_node(&self, id: &str) -> Option<NodeIdx> {
        self.node_index.get(id).copied()
    }

    /// Store `line` unless a line with its id already exists.  Returns the
    /// handle either way; an existing line is never replaced.
    pub fn insert_line(&mut self, line: Line) -> LineIdx {
        if let Some(h) = self.line_index.get(&line.id) {
            return *h;
        }
        let h = LineIdx(self.lines.len() as u32);
        self.line_index.insert(line.id.clone(), h);
        self.lines.push(line);
        h
    }

    /// Store `node` unless a node with its id already exists.
    pub fn insert_node(&mut self, node: Node) -> NodeIdx {
        if let Some(h) = self.node_index.get(&node.id) {
            return *h;
        }
        let h = NodeIdx(self.nodes.len() as u32);
        self.node_index.insert(node.id.clone(), h);
        self.nodes.push(node);
        h
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every line handle, in insertion order.
    pub fn line_handles(&self) -> impl Iterator<Item = LineIdx> + '_ {
        (0..self.lines.len()).map(|i| LineIdx(i as u32))
    }

    pub fn node_handles(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        (0..self.nodes.len()).map(|i| NodeIdx(i as u32))
    }

    /// Drop lines that are peers of `exclude_peer_of` from `lines`.
    pub fn without_peer(&self, lines: &[LineIdx], exclude_peer_of: Option<LineIdx>) -> Vec<LineIdx> {
        match exclude_peer_of {
            None => lines.to_vec(),
            Some(src) => {
                let src = &self.line(src).id;
                lines.iter().copied().filter(|&l| !are_peers(&self.line(l).id, src)).collect()
            }
        }
    }
}

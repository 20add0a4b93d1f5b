//! The interface decoders use to look at a map.

use olr_core::{Coordinates, LineIdx, LocationReference, NodeIdx};
use olr_geo::Crs;

use crate::arena::{Line, Node};
use crate::MapResult;

/// Read access to a directed road graph, as required by an OpenLR decoder.
///
/// Handles are only meaningful for the reader that issued them.  Queries
/// that may materialize new objects take `&mut self`.  Coordinates in and
/// out are in the reader's [`crs`](Self::crs); radii are ground metres.
///
/// Implemented by [`FullMap`](crate::FullMap) and
/// [`BufferMap`](crate::BufferMap); the trait is object safe so decoders can
/// take `&mut dyn MapReader`.
pub trait MapReader {
    /// CRS of the underlying store.
    fn crs(&self) -> Crs;

    fn line(&self, h: LineIdx) -> &Line;

    fn node(&self, h: NodeIdx) -> &Node;

    /// Handle of an already materialized line; `LineNotFound` otherwise.
    fn get_line(&self, id: &str) -> MapResult<LineIdx>;

    /// Handle of an already materialized node; `NodeNotFound` otherwise.
    fn get_node(&self, id: &str) -> MapResult<NodeIdx>;

    /// Every line this reader exposes.
    fn get_lines(&mut self) -> MapResult<Vec<LineIdx>>;

    fn get_nodes(&mut self) -> MapResult<Vec<NodeIdx>>;

    fn line_count(&self) -> MapResult<usize>;

    fn node_count(&self) -> MapResult<usize>;

    /// Lines within `radius_m` metres of `coord`.
    fn find_lines_close_to(&mut self, coord: Coordinates, radius_m: f64) -> MapResult<Vec<LineIdx>>;

    /// Nodes within `radius_m` metres of `coord`.
    fn find_nodes_close_to(&mut self, coord: Coordinates, radius_m: f64) -> MapResult<Vec<NodeIdx>>;

    /// Lines leaving `node`, minus the peer of `exclude_peer_of`.
    fn outgoing_lines(&mut self, node: NodeIdx, exclude_peer_of: Option<LineIdx>) -> MapResult<Vec<LineIdx>>;

    /// Lines entering `node`, minus the peer of `exclude_peer_of`.
    fn incoming_lines(&mut self, node: NodeIdx, exclude_peer_of: Option<LineIdx>) -> MapResult<Vec<LineIdx>>;

    /// Incoming lines followed by outgoing lines.  A line that is both (a
    /// loop) appears once.
    fn connected_lines(&mut self, node: NodeIdx) -> MapResult<Vec<LineIdx>> {
        let mut all = self.incoming_lines(node, None)?;
        for l in self.outgoing_lines(node, None)? {
            if !all.contains(&l) {
                all.push(l);
            }
        }
        Ok(all)
    }

    fn start_node(&mut self, line: LineIdx) -> MapResult<NodeIdx>;

    fn end_node(&mut self, line: LineIdx) -> MapResult<NodeIdx>;
}

/// `reference` with every coordinate moved from WGS84 into `crs`.
///
/// OpenLR codes always carry WGS84; decoders expect references in the CRS of
/// the reader they decode on.  Bearings and distances are ground values and
/// carry over unchanged.
pub fn reference_in(crs: Crs, reference: &LocationReference) -> LocationReference {
    match crs {
        Crs::Wgs84 => reference.clone(),
        Crs::WebMercator => reference.map_coords(|c| crs.project(c)),
    }
}

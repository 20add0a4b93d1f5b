//! Unit tests for olr-map.
//!
//! All tests use hand-crafted maps, so no database file is needed except in
//! the SQLite module, which writes to a temporary directory.

#[cfg(test)]
mod helpers {
    use olr_core::{Coordinates, Fow, Frc};
    use olr_geo::Crs;

    use crate::{Direction, IntersectionRow, MemoryStore, MemoryStoreBuilder, RoadRow};

    pub fn c(lon: f64, lat: f64) -> Coordinates {
        Coordinates::new(lon, lat)
    }

    pub const A: (f64, f64) = (6.100, 49.600);
    pub const B: (f64, f64) = (6.101, 49.600);
    pub const C: (f64, f64) = (6.102, 49.600);
    pub const D: (f64, f64) = (6.101, 49.601);

    pub fn road(id: &str, direction: Direction, from: (&str, (f64, f64)), to: (&str, (f64, f64))) -> RoadRow {
        let geometry = vec![c(from.1 .0, from.1 .1), c(to.1 .0, to.1 .1)];
        RoadRow {
            id: id.into(),
            fow: Fow::SingleCarriageway,
            frc: Frc::Frc3,
            direction,
            start_id: from.0.into(),
            end_id: to.0.into(),
            length_m: olr_geo::line_string_length(&geometry),
            geometry,
        }
    }

    /// A small T junction around node B:
    ///
    /// ```text
    ///         D
    ///         ^ road 3 (reverse only: D -> B)
    ///   A --- B --- C
    ///   road 1 (both)   road 2 (forward only)
    /// ```
    pub fn rows() -> (Vec<RoadRow>, Vec<IntersectionRow>) {
        let roads = vec![
            road("1", Direction::Both, ("A", A), ("B", B)),
            road("2", Direction::Forward, ("B", B), ("C", C)),
            road("3", Direction::Reverse, ("B", B), ("D", D)),
        ];
        let nodes = [("A", A), ("B", B), ("C", C), ("D", D)]
            .into_iter()
            .map(|(id, p)| IntersectionRow { id: id.into(), coord: c(p.0, p.1) })
            .collect();
        (roads, nodes)
    }

    pub fn junction() -> MemoryStore {
        let (roads, nodes) = rows();
        MemoryStoreBuilder::new().extend(roads, nodes).build().unwrap()
    }

    pub fn merc(p: (f64, f64)) -> Coordinates {
        Crs::WebMercator.project(c(p.0, p.1))
    }

    /// [`rows`] with every coordinate in EPSG:3857.  Lengths stay in metres.
    pub fn projected_rows() -> (Vec<RoadRow>, Vec<IntersectionRow>) {
        let (mut roads, mut nodes) = rows();
        for road in &mut roads {
            for p in &mut road.geometry {
                *p = Crs::WebMercator.project(*p);
            }
        }
        for node in &mut nodes {
            node.coord = Crs::WebMercator.project(node.coord);
        }
        (roads, nodes)
    }

    pub fn projected_junction() -> MemoryStore {
        let (roads, nodes) = projected_rows();
        MemoryStoreBuilder::new().crs(Crs::WebMercator).extend(roads, nodes).build().unwrap()
    }
}

// ── Virtualization & peers ────────────────────────────────────────────────────

#[cfg(test)]
mod virtualization {
    use super::helpers::{road, A, B};
    use crate::{are_peers, virtualize, Direction};

    #[test]
    fn two_way_road_gives_reversed_twin() {
        let row = road("7", Direction::Both, ("A", A), ("B", B));
        let lines = virtualize(&row);
        assert_eq!(lines.len(), 2);
        let (fwd, rev) = (&lines[0], &lines[1]);
        assert_eq!(fwd.id, "7");
        assert_eq!(rev.id, "-7");
        assert!(fwd.is_peer_of(rev));
        assert_eq!((fwd.start_id.as_str(), fwd.end_id.as_str()), ("A", "B"));
        assert_eq!((rev.start_id.as_str(), rev.end_id.as_str()), ("B", "A"));
        let mut back = rev.geometry.clone();
        back.reverse();
        assert_eq!(back, fwd.geometry);
        assert_eq!(fwd.length_m, rev.length_m);
        assert_eq!((fwd.fow, fwd.frc), (rev.fow, rev.frc));
    }

    #[test]
    fn one_way_roads_give_one_line() {
        let fwd = virtualize(&road("8", Direction::Forward, ("A", A), ("B", B)));
        assert_eq!(fwd.len(), 1);
        assert_eq!(fwd[0].id, "8");

        let rev = virtualize(&road("9", Direction::Reverse, ("A", A), ("B", B)));
        assert_eq!(rev.len(), 1);
        assert_eq!(rev[0].id, "-9");
        assert_eq!(rev[0].start_id, "B");
        assert_eq!(rev[0].road_id(), "9");
    }

    #[test]
    fn peers_by_id_only() {
        assert!(are_peers("12", "-12"));
        assert!(are_peers("-12", "12"));
        assert!(!are_peers("12", "12"));
        assert!(!are_peers("-12", "-12"));
        assert!(!are_peers("12", "-123"));
        assert!(!are_peers("--12", "12"));
    }

    #[test]
    fn direction_codes() {
        assert_eq!(Direction::from_code(1), Some(Direction::Both));
        assert_eq!(Direction::from_code(3), Some(Direction::Reverse));
        assert_eq!(Direction::from_code(0), None);
        assert_eq!(Direction::Forward.code(), 2);
    }
}

// ── Full map ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod full_map {
    use super::helpers::{c, junction, B};
    use crate::{FullMap, MapError, MapReader};

    fn ids(map: &FullMap<crate::MemoryStore>, lines: &[olr_core::LineIdx]) -> Vec<String> {
        let mut v: Vec<String> = lines.iter().map(|&l| map.line(l).id.clone()).collect();
        v.sort();
        v
    }

    #[test]
    fn get_line_needs_materialization() {
        let mut map = FullMap::new(junction());
        assert!(matches!(map.get_line("1"), Err(MapError::LineNotFound(_))));
        map.find_lines_close_to(c(B.0, B.1), 5.0).unwrap();
        assert!(map.get_line("1").is_ok());
        assert!(map.get_line("-1").is_ok());
        assert!(map.get_line("-2").is_err());
    }

    #[test]
    fn proximity_uses_true_distance() {
        let mut map = FullMap::new(junction());
        let near_b = map.find_lines_close_to(c(B.0, B.1), 1.0).unwrap();
        assert_eq!(ids(&map, &near_b), ["-1", "-3", "1", "2"]);

        // 36 m north of road 1, near A: roads 2 and 3 are over 50 m away.
        let query = olr_geo::extrapolate(c(6.1002, 49.600), 36.0, 0.0);
        let near = map.find_lines_close_to(query, 40.0).unwrap();
        assert_eq!(ids(&map, &near), ["-1", "1"]);
        assert!(map.find_lines_close_to(c(7.0, 50.0), 100.0).unwrap().is_empty());

        let nodes = map.find_nodes_close_to(c(B.0, B.1), 10.0).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(map.node(nodes[0]).id, "B");
    }

    #[test]
    fn adjacency_follows_direction() {
        let mut map = FullMap::new(junction());
        let b = map.fetch_node("B").unwrap();
        let out = map.outgoing_lines(b, None).unwrap();
        let inc = map.incoming_lines(b, None).unwrap();
        assert_eq!(ids(&map, &out), ["-1", "2"]);
        assert_eq!(ids(&map, &inc), ["-3", "1"]);
        let all = map.connected_lines(b).unwrap();
        assert_eq!(ids(&map, &all), ["-1", "-3", "1", "2"]);
    }

    #[test]
    fn peer_is_excluded_from_traversal() {
        let mut map = FullMap::new(junction());
        let b = map.fetch_node("B").unwrap();
        let one = map.fetch_line("1").unwrap();
        let out = map.outgoing_lines(b, Some(one)).unwrap();
        assert_eq!(ids(&map, &out), ["2"]);
        for l in map.get_lines().unwrap() {
            for node in [map.start_node(l).unwrap(), map.end_node(l).unwrap()] {
                let peer_free = map.outgoing_lines(node, Some(l)).unwrap();
                let incoming = map.incoming_lines(node, Some(l)).unwrap();
                for other in peer_free.into_iter().chain(incoming) {
                    assert!(!map.line(other).is_peer_of(map.line(l)));
                }
            }
        }
    }

    #[test]
    fn endpoints_resolve_lazily_and_once() {
        let mut map = FullMap::new(junction());
        let l = map.fetch_line("-3").unwrap();
        assert_eq!(map.node_count().unwrap(), 4);
        let s = map.start_node(l).unwrap();
        assert_eq!(map.node(s).id, "D");
        assert_eq!(map.start_node(l).unwrap(), s);
        let e = map.end_node(l).unwrap();
        assert_eq!(map.node(e).id, "B");
    }

    #[test]
    fn counts_and_scans() {
        let mut map = FullMap::new(junction());
        assert_eq!(map.line_count().unwrap(), 4);
        assert_eq!(map.get_lines().unwrap().len(), 4);
        assert_eq!(map.get_nodes().unwrap().len(), 4);
        assert!(matches!(map.fetch_line("99"), Err(MapError::LineNotFound(_))));
        assert!(matches!(map.fetch_node("Z"), Err(MapError::NodeNotFound(_))));
    }
}

// ── Buffer map ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod buffer_map {
    use olr_core::{Fow, Frc, LineReference, Lrp};
    use olr_geo::Buffer;

    use super::helpers::{c, junction, A, B, C, D};
    use crate::{BufferMap, FullMap, MapReader};

    fn lrp(lon: f64, lat: f64) -> Lrp {
        Lrp {
            coord: c(lon, lat),
            frc: Frc::Frc3,
            fow: Fow::SingleCarriageway,
            bearing_deg: 90.0,
            lfrcnp: Frc::Frc3,
            dnp_m: 0.0,
        }
    }

    /// Reference A -> B, buffer around A–B only.
    fn setup() -> (FullMap<crate::MemoryStore>, Buffer, LineReference) {
        let buffer = Buffer::around(&[c(A.0, A.1), c(B.0, B.1)], 10.0).unwrap();
        let reference = LineReference {
            points: vec![lrp(A.0, A.1), lrp(B.0, B.1)],
            positive_offset_m: 0.0,
            negative_offset_m: 0.0,
        };
        (FullMap::new(junction()), buffer, reference)
    }

    #[test]
    fn only_contained_lines_are_traversable() {
        let (mut full, buffer, reference) = setup();
        let mut map = BufferMap::new(&mut full, &buffer, reference).unwrap();
        let visible: Vec<String> =
            map.get_lines().unwrap().iter().map(|&l| map.line(l).id.clone()).collect();
        assert_eq!(visible, ["1", "-1"]);

        let b = map.get_node("B").unwrap();
        let out: Vec<String> =
            map.outgoing_lines(b, None).unwrap().iter().map(|&l| map.line(l).id.clone()).collect();
        assert_eq!(out, ["-1"]);
        assert!(map.incoming_lines(b, None).unwrap().iter().all(|&l| map.line(l).contained));
    }

    #[test]
    fn terminal_lrp_sees_lines_outside_buffer() {
        let (mut full, buffer, reference) = setup();
        let mut map = BufferMap::new(&mut full, &buffer, reference).unwrap();

        // B is the last LRP: roads 2 and 3 leave the buffer but are candidates.
        let at_b = map.find_lines_close_to(c(B.0, B.1), 2.0).unwrap();
        let mut ids: Vec<String> = at_b.iter().map(|&l| map.line(l).id.clone()).collect();
        ids.sort();
        assert_eq!(ids, ["-1", "-3", "1", "2"]);

        // A non-terminal query point next to B only sees contained lines.
        let query = olr_geo::extrapolate(c(B.0, B.1), 1.0, -std::f64::consts::FRAC_PI_2);
        let near: Vec<String> = map
            .find_lines_close_to(query, 3.0)
            .unwrap()
            .iter()
            .map(|&l| map.line(l).id.clone())
            .collect();
        assert_eq!(near, ["1", "-1"]);
    }

    #[test]
    fn nodes_follow_the_same_visibility() {
        let (mut full, buffer, reference) = setup();
        let mut map = BufferMap::new(&mut full, &buffer, reference).unwrap();
        let far_end = map.find_nodes_close_to(c(C.0, C.1), 5.0).unwrap();
        assert!(far_end.is_empty());
        let d = olr_geo::extrapolate(c(D.0, D.1), 0.5, 0.0);
        assert!(map.find_nodes_close_to(d, 5.0).unwrap().is_empty());
        assert_eq!(map.get_nodes().unwrap().len(), 2);
        assert_eq!(map.node_count().unwrap(), 2);
    }

    #[test]
    fn get_line_is_cache_only() {
        let (mut full, buffer, reference) = setup();
        let map = BufferMap::new(&mut full, &buffer, reference).unwrap();
        assert!(map.get_line("1").is_ok());
        assert!(map.get_line("2").is_ok());
        assert!(map.get_line("-2").is_err());
    }
}

// ── Stores ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stores {
    use rusqlite::Connection;

    use super::helpers::{c, junction, rows, B};
    use crate::{RoadStore, SqliteStore, StoreConfig};

    fn sqlite_copy(dir: &std::path::Path, config: &StoreConfig) -> SqliteStore {
        let path = dir.join("map.db");
        let (roads, nodes) = rows();
        {
            let conn = Connection::open(&path).unwrap();
            SqliteStore::create_schema(&conn, config).unwrap();
            SqliteStore::insert_roads(&conn, config, &roads).unwrap();
            SqliteStore::insert_intersections(&conn, config, &nodes).unwrap();
        }
        SqliteStore::open(&path, config.clone()).unwrap()
    }

    #[test]
    fn sqlite_matches_memory() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default();
        let sql = sqlite_copy(dir.path(), &config);
        let mem = junction();

        assert_eq!(sql.road_count().unwrap(), mem.road_count().unwrap());
        assert_eq!(sql.intersection_count().unwrap(), 4);
        assert_eq!(sql.directed_line_count().unwrap(), mem.directed_line_count().unwrap());
        assert_eq!(sql.roads().unwrap(), mem.roads().unwrap());
        assert_eq!(sql.road("2").unwrap(), mem.road("2").unwrap());
        assert_eq!(sql.road("nope").unwrap(), None);
        assert_eq!(sql.roads_at_node("B").unwrap(), mem.roads_at_node("B").unwrap());
        assert_eq!(sql.intersection("D").unwrap(), mem.intersection("D").unwrap());

        let rect = olr_geo::search_rect(c(B.0, B.1), 5.0);
        assert_eq!(sql.roads_in_bbox(rect).unwrap(), mem.roads_in_bbox(rect).unwrap());
        assert_eq!(
            sql.intersections_in_bbox(rect).unwrap(),
            mem.intersections_in_bbox(rect).unwrap()
        );
        assert_eq!(sql.extent().unwrap(), mem.extent().unwrap());
    }

    #[test]
    fn custom_table_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            lines_table: "roads_v2".into(),
            nodes_table: "junctions_v2".into(),
            ..StoreConfig::default()
        };
        let sql = sqlite_copy(dir.path(), &config);
        assert_eq!(sql.road_count().unwrap(), 3);
        assert_eq!(sql.config().lines_table, "roads_v2");
        assert_eq!(sql.crs(), olr_geo::Crs::Wgs84);
    }

    #[test]
    fn bad_direction_is_an_invalid_row() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default();
        let path = dir.path().join("bad.db");
        let conn = Connection::open(&path).unwrap();
        SqliteStore::create_schema(&conn, &config).unwrap();
        conn.execute(
            "INSERT INTO lines VALUES ('x', 3, 3, 9, 'A', 'B', 1.0, '[[0,0],[1,1]]', 0, 0, 1, 1)",
            [],
        )
        .unwrap();
        let store = SqliteStore::from_connection(conn, config);
        assert!(matches!(store.roads(), Err(crate::MapError::InvalidRow { .. })));
    }

    #[test]
    fn empty_store_has_no_extent() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default();
        let conn = Connection::open(dir.path().join("empty.db")).unwrap();
        SqliteStore::create_schema(&conn, &config).unwrap();
        let store = SqliteStore::from_connection(conn, config);
        assert_eq!(store.extent().unwrap(), None);
        assert_eq!(store.directed_line_count().unwrap(), 0);
        assert!(crate::MemoryStoreBuilder::new().build().unwrap().extent().unwrap().is_none());
    }

    #[test]
    fn memory_store_rejects_degenerate_roads() {
        let (roads, nodes) = rows();
        let built = crate::MemoryStoreBuilder::new()
            .extend(roads, nodes)
            .modify_road("2", |r| r.geometry.truncate(1))
            .build();
        assert!(matches!(built, Err(crate::MapError::InvalidRow { ref id, .. }) if id == "2"));

        let (roads, nodes) = rows();
        let built = crate::MemoryStoreBuilder::new()
            .extend(roads, nodes)
            .modify_road("1", |r| r.id = "-1".into())
            .build();
        assert!(matches!(built, Err(crate::MapError::InvalidRow { .. })));
    }
}

// ── Web Mercator maps ─────────────────────────────────────────────────────────

#[cfg(test)]
mod web_mercator {
    use rusqlite::Connection;

    use olr_core::{Fow, Frc, LineIdx, LineReference, LocationReference, Lrp};
    use olr_geo::{Buffer, Crs};

    use super::helpers::{c, junction, merc, projected_junction, projected_rows, A, B};
    use crate::{reference_in, BufferMap, FullMap, MapError, MapReader, RoadStore, SqliteStore, StoreConfig};

    const MERC: Crs = Crs::WebMercator;

    fn sorted_ids(map: &dyn MapReader, lines: &[LineIdx]) -> Vec<String> {
        let mut ids: Vec<String> = lines.iter().map(|&l| map.line(l).id.clone()).collect();
        ids.sort();
        ids
    }

    fn reference() -> LineReference {
        let lrp = |p: (f64, f64)| Lrp {
            coord: c(p.0, p.1),
            frc: Frc::Frc3,
            fow: Fow::SingleCarriageway,
            bearing_deg: 90.0,
            lfrcnp: Frc::Frc3,
            dnp_m: 0.0,
        };
        LineReference { points: vec![lrp(A), lrp(B)], positive_offset_m: 0.0, negative_offset_m: 0.0 }
    }

    #[test]
    fn full_map_radii_are_ground_metres() {
        let mut map = FullMap::new(projected_junction());
        assert_eq!(map.crs(), MERC);

        let near_b = map.find_lines_close_to(merc(B), 1.0).unwrap();
        assert_eq!(sorted_ids(&map, &near_b), ["-1", "-3", "1", "2"]);

        // 36 m north of road 1 near A; in raw 3857 units that is about 55.
        let query = MERC.project(olr_geo::extrapolate(c(6.1002, 49.600), 36.0, 0.0));
        let near = map.find_lines_close_to(query, 40.0).unwrap();
        assert_eq!(sorted_ids(&map, &near), ["-1", "1"]);
        assert_eq!(map.find_nodes_close_to(merc(B), 10.0).unwrap().len(), 1);
    }

    #[test]
    fn buffer_map_decodes_in_the_map_crs() {
        let mut full = FullMap::new(projected_junction());
        let buffer = Buffer::around_in(MERC, &[merc(A), merc(B)], 10.0).unwrap();
        let mut map = BufferMap::new(&mut full, &buffer, reference()).unwrap();

        assert_eq!(map.crs(), MERC);
        assert_eq!(map.reference().first().coord, merc(A));
        assert_eq!(map.reference().first().bearing_deg, 90.0);
        let visible = map.get_lines().unwrap();
        assert_eq!(sorted_ids(&map, &visible), ["-1", "1"]);

        // The projected last LRP is terminal, so lines leaving the buffer show up.
        let at_b = map.find_lines_close_to(merc(B), 2.0).unwrap();
        assert_eq!(sorted_ids(&map, &at_b), ["-1", "-3", "1", "2"]);
    }

    #[test]
    fn buffer_in_another_crs_is_rejected() {
        let mut full = FullMap::new(projected_junction());
        let buffer = Buffer::around(&[c(A.0, A.1), c(B.0, B.1)], 10.0).unwrap();
        let err = BufferMap::new(&mut full, &buffer, reference()).err().unwrap();
        assert!(matches!(err, MapError::CrsMismatch { map: Crs::WebMercator, buffer: Crs::Wgs84 }));

        let mut wgs = FullMap::new(junction());
        let buffer = Buffer::around_in(MERC, &[merc(A), merc(B)], 10.0).unwrap();
        assert!(BufferMap::new(&mut wgs, &buffer, reference()).is_err());
    }

    #[test]
    fn reference_in_moves_every_lrp() {
        let wgs = LocationReference::Line(reference());
        assert_eq!(reference_in(Crs::Wgs84, &wgs), wgs);

        let projected = reference_in(MERC, &wgs);
        let line = projected.as_line().unwrap();
        assert_eq!(line.first().coord, merc(A));
        assert_eq!(line.last().coord, merc(B));
    }

    #[test]
    fn sqlite_store_reports_configured_crs() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig { crs: MERC, ..StoreConfig::default() };
        let path = dir.path().join("merc.db");
        let (roads, nodes) = projected_rows();
        {
            let conn = Connection::open(&path).unwrap();
            SqliteStore::create_schema(&conn, &config).unwrap();
            SqliteStore::insert_roads(&conn, &config, &roads).unwrap();
            SqliteStore::insert_intersections(&conn, &config, &nodes).unwrap();
        }
        let sql = SqliteStore::open(&path, config).unwrap();
        assert_eq!(sql.crs(), MERC);

        let mem = projected_junction();
        let rect = MERC.search_rect(merc(B), 5.0);
        assert_eq!(sql.roads_in_bbox(rect).unwrap(), mem.roads_in_bbox(rect).unwrap());

        let mut map = FullMap::new(sql);
        let near_b = map.find_lines_close_to(merc(B), 1.0).unwrap();
        assert_eq!(sorted_ids(&map, &near_b), ["-1", "-3", "1", "2"]);
    }
}

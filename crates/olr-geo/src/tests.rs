//! Unit tests for the geodesic toolkit, Web Mercator metric and buffer polygons.

#[cfg(test)]
mod geodesic {
    use std::f64::consts::{FRAC_PI_2, PI};

    use olr_core::Coordinates;

    use crate::{
        bearing, distance, distance_to_line, extrapolate, interpolate, join_lines,
        line_string_length, project_onto_line, search_rect, split_line, GeoError,
    };

    fn c(lon: f64, lat: f64) -> Coordinates {
        Coordinates::new(lon, lat)
    }

    /// An L-shaped path in Luxembourg: east, then north.
    fn path() -> Vec<Coordinates> {
        vec![c(6.10, 49.60), c(6.11, 49.60), c(6.12, 49.60), c(6.12, 49.61)]
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance(c(6.0, 49.0), c(6.0, 50.0));
        assert!((d - 111_219.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn bearing_is_signed_from_north() {
        let o = c(6.0, 49.6);
        assert!(bearing(o, c(6.0, 49.7)).abs() < 1e-9);
        assert!((bearing(o, c(6.1, 49.6)) - FRAC_PI_2).abs() < 0.01);
        assert!((bearing(o, c(5.9, 49.6)) + FRAC_PI_2).abs() < 0.01);
        let south = bearing(o, c(6.0, 49.5));
        assert!((south.abs() - PI).abs() < 1e-9, "got {south}");
    }

    #[test]
    fn extrapolate_inverts_distance_and_bearing() {
        let o = c(6.0, 49.6);
        let p = extrapolate(o, 1_234.5, 0.7);
        assert!((distance(o, p) - 1_234.5).abs() < 1e-6);
        assert!((bearing(o, p) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn interpolate_hits_vertices_and_clamps() {
        let p = path();
        let first_leg = distance(p[0], p[1]);
        assert_eq!(interpolate(&p, 0.0).unwrap(), p[0]);
        assert_eq!(interpolate(&p, -5.0).unwrap(), p[0]);
        assert_eq!(interpolate(&p, first_leg).unwrap(), p[1]);
        assert_eq!(interpolate(&p, 1e9).unwrap(), p[3]);
        assert!(matches!(interpolate(&[], 1.0), Err(GeoError::EmptyGeometry)));
    }

    #[test]
    fn interpolate_is_monotone() {
        let p = path();
        let total = line_string_length(&p);
        let mut prev = 0.0;
        for i in 1..50 {
            let d = total * i as f64 / 50.0;
            let point = interpolate(&p, d).unwrap();
            let prefix = split_line(&p, d).0.unwrap();
            assert_eq!(prefix.last(), Some(&point));
            let progress = line_string_length(&prefix);
            assert!((progress - d).abs() < 1e-6);
            assert!(progress > prev);
            prev = progress;
        }
        assert_eq!(interpolate(&p, total * 2.0).unwrap(), p[3]);
    }

    #[test]
    fn split_lengths_add_up() {
        let p = path();
        let total = line_string_length(&p);
        for d in [1.0, 333.3, total / 2.0, total - 0.5] {
            let (pre, suf) = split_line(&p, d);
            let (pre, suf) = (pre.unwrap(), suf.unwrap());
            let sum = line_string_length(&pre) + line_string_length(&suf);
            assert!((sum - total).abs() <= total * 1e-6, "d={d}: {sum} vs {total}");
            assert_eq!(pre.last(), suf.first());
        }
    }

    #[test]
    fn split_edges() {
        let p = path();
        let total = line_string_length(&p);
        assert_eq!(split_line(&p, 0.0), (None, Some(p.clone())));
        assert_eq!(split_line(&p, total + 1.0), (Some(p.clone()), None));
    }

    #[test]
    fn split_at_vertex_joins_back_exactly() {
        let p = path();
        let d = distance(p[0], p[1]) + distance(p[1], p[2]);
        let (pre, suf) = split_line(&p, d);
        let (pre, suf) = (pre.unwrap(), suf.unwrap());
        assert_eq!(pre, p[..3].to_vec());
        assert_eq!(join_lines(&[pre, suf]).unwrap(), p);
    }

    #[test]
    fn split_mid_segment_inserts_one_coordinate() {
        let p = path();
        let (pre, suf) = split_line(&p, 100.0);
        let joined = join_lines(&[pre.unwrap(), suf.unwrap()]).unwrap();
        assert_eq!(joined.len(), p.len() + 1);
        assert_eq!(joined[0], p[0]);
        assert_eq!(joined[2..], p[1..]);
    }

    #[test]
    fn join_requires_exact_contiguity() {
        let a = vec![c(6.0, 49.0), c(6.1, 49.0)];
        let b = vec![c(6.1, 49.0000001), c(6.2, 49.0)];
        let err = join_lines(&[a, b]).unwrap_err();
        assert!(matches!(err, GeoError::NotConnected { index: 1, .. }));
    }

    #[test]
    fn distance_to_line_measures_perpendicular() {
        let line = vec![c(6.10, 49.60), c(6.12, 49.60)];
        let query = extrapolate(c(6.11, 49.60), 25.0, 0.0);
        let d = distance_to_line(query, &line);
        assert!((d - 25.0).abs() < 0.5, "got {d}");
        assert_eq!(distance_to_line(query, &[]), f64::INFINITY);
    }

    #[test]
    fn projection_reports_progress_along_line() {
        let p = path();
        let first_leg = distance(p[0], p[1]);
        let query = extrapolate(extrapolate(p[1], 200.0, bearing(p[1], p[2])), 10.0, PI);
        let (along, off) = project_onto_line(query, &p).unwrap();
        assert!((along - (first_leg + 200.0)).abs() < 0.5, "along {along}");
        assert!((off - 10.0).abs() < 0.5, "off {off}");
        assert!(project_onto_line(query, &[]).is_none());
    }

    #[test]
    fn search_rect_covers_radius() {
        let o = c(6.1, 49.6);
        let rect = search_rect(o, 100.0);
        for az in [0.0, FRAC_PI_2, PI, -FRAC_PI_2] {
            let p = extrapolate(o, 99.0, az);
            assert!(p.lon >= rect.min().x && p.lon <= rect.max().x);
            assert!(p.lat >= rect.min().y && p.lat <= rect.max().y);
        }
    }
}

#[cfg(test)]
mod buffer {
    use olr_core::Coordinates;

    use crate::{extrapolate, line_string_length, Buffer, GeoError};

    fn c(lon: f64, lat: f64) -> Coordinates {
        Coordinates::new(lon, lat)
    }

    fn source() -> Vec<Coordinates> {
        vec![c(6.10, 49.60), c(6.11, 49.60), c(6.11, 49.605)]
    }

    #[test]
    fn source_is_inside_its_own_buffer() {
        let b = Buffer::around(&source(), 20.0).unwrap();
        assert!(b.contains_line(&source()));
        assert!(b.contains_point(c(6.105, 49.60)));
    }

    #[test]
    fn parallel_offset_inside_radius_is_contained() {
        let b = Buffer::around(&source(), 20.0).unwrap();
        let shifted: Vec<Coordinates> =
            vec![c(6.101, 49.60), c(6.109, 49.60)].into_iter().map(|p| extrapolate(p, 15.0, 0.0)).collect();
        assert!(b.contains_line(&shifted));
        let far: Vec<Coordinates> = shifted.iter().map(|&p| extrapolate(p, 30.0, 0.0)).collect();
        assert!(!b.contains_line(&far));
        assert!(!b.intersects_line(&far));
    }

    #[test]
    fn intersection_length_of_partial_overlap() {
        let b = Buffer::around(&source(), 20.0).unwrap();
        // Runs along the first leg, then continues 700 m east past the corner.
        let query = vec![c(6.10, 49.60), c(6.11, 49.60), c(6.12, 49.60)];
        let inside = b.intersection_length(&query);
        let total = line_string_length(&query);
        let first_leg = line_string_length(&query[..2]);
        assert!(inside > first_leg, "{inside} <= {first_leg}");
        assert!(inside < first_leg + 30.0);
        assert!(inside < total);
        assert!(!b.contains_line(&query));
    }

    #[test]
    fn bounding_rect_encloses_source() {
        let b = Buffer::around(&source(), 20.0).unwrap();
        let r = b.bounding_rect().unwrap();
        for p in source() {
            assert!(p.lon > r.min().x && p.lon < r.max().x);
            assert!(p.lat > r.min().y && p.lat < r.max().y);
        }
    }

    #[test]
    fn single_point_buffer_is_a_disc() {
        let b = Buffer::around(&[c(6.1, 49.6)], 50.0).unwrap();
        assert!(b.contains_point(extrapolate(c(6.1, 49.6), 49.0, 1.0)));
        assert!(!b.contains_point(extrapolate(c(6.1, 49.6), 60.0, 1.0)));
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(Buffer::around(&[], 10.0), Err(GeoError::EmptyGeometry)));
        assert!(matches!(Buffer::around(&source(), 0.0), Err(GeoError::InvalidRadius(_))));
    }
}

#[cfg(test)]
mod crs {
    use std::f64::consts::{FRAC_PI_2, PI};

    use olr_core::Coordinates;

    use crate::{
        distance, extrapolate, line_string_length, lon_lat_to_web_merc, web_merc_to_lon_lat,
        Buffer, Crs,
    };

    const MERC: Crs = Crs::WebMercator;

    fn c(x: f64, y: f64) -> Coordinates {
        Coordinates::new(x, y)
    }

    fn path() -> Vec<Coordinates> {
        vec![c(6.10, 49.60), c(6.11, 49.60), c(6.12, 49.60), c(6.12, 49.61)]
    }

    fn projected(line: &[Coordinates]) -> Vec<Coordinates> {
        line.iter().map(|&p| MERC.project(p)).collect()
    }

    #[test]
    fn transform_matches_known_point() {
        let (x, y) = lon_lat_to_web_merc(-95.04189848899841, 29.41189169883728);
        assert!((x - -10_580_015.75).abs() < 0.01, "x {x}");
        assert!((y - 3_428_175.80).abs() < 0.01, "y {y}");

        let (lon, lat) = web_merc_to_lon_lat(x, y);
        assert!((lon - -95.04189848899841).abs() < 1e-9);
        assert!((lat - 29.41189169883728).abs() < 1e-9);

        let p = c(6.1, 49.6);
        assert_eq!(Crs::Wgs84.project(p), p);
        let back = MERC.unproject(MERC.project(p));
        assert!((back.lon - p.lon).abs() < 1e-12 && (back.lat - p.lat).abs() < 1e-12);
        assert_eq!((Crs::default().epsg(), MERC.epsg()), (4326, 3857));
    }

    #[test]
    fn planar_metric_at_the_equator() {
        let o = c(0.0, 0.0);
        assert_eq!(MERC.distance(o, c(1.0, 0.0)), 1.0);
        assert_eq!(MERC.distance(o, c(3.0, 4.0)), 5.0);
        assert_eq!(MERC.bearing(o, c(0.0, 1.0)), 0.0);
        assert_eq!(MERC.bearing(o, c(1.0, 0.0)), FRAC_PI_2);
        assert_eq!(MERC.bearing(c(1.0, 0.0), o), -FRAC_PI_2);
        assert_eq!(MERC.bearing(c(0.0, 1.0), o), PI);
    }

    #[test]
    fn planar_lengths_are_ground_metres() {
        let wgs = path();
        let geodesic_len = line_string_length(&wgs);
        let merc_len = MERC.line_string_length(&projected(&wgs));
        // Sphere versus ellipsoid.
        assert!((merc_len / geodesic_len - 1.0).abs() < 0.005, "{merc_len} vs {geodesic_len}");

        let a = c(6.1, 49.6);
        let b = extrapolate(a, 800.0, 0.4);
        let d = MERC.distance(MERC.project(a), MERC.project(b));
        assert!((d / distance(a, b) - 1.0).abs() < 0.005, "got {d}");
    }

    #[test]
    fn planar_extrapolate_inverts_distance_and_bearing() {
        let o = MERC.project(c(6.1, 49.6));
        for az in [0.0, 0.7, FRAC_PI_2, -2.5, PI] {
            let p = MERC.extrapolate(o, 500.0, az);
            assert!((MERC.distance(o, p) - 500.0).abs() < 1e-3, "az {az}");
            assert!((MERC.bearing(o, p) - az).abs() < 1e-9, "az {az}");
        }
    }

    #[test]
    fn planar_path_operations() {
        let line = projected(&path());
        let total = MERC.line_string_length(&line);

        let (head, tail) = MERC.split_line(&line, 300.0);
        let (head, tail) = (head.unwrap(), tail.unwrap());
        assert!((MERC.line_string_length(&head) - 300.0).abs() < 1e-4);
        assert!((MERC.line_string_length(&head) + MERC.line_string_length(&tail) - total).abs() < 1e-4);
        assert_eq!(MERC.interpolate(&line, 300.0).unwrap(), *head.last().unwrap());
        assert_eq!(MERC.interpolate(&line, total + 10.0).unwrap(), line[3]);

        let first_leg = MERC.distance(line[0], line[1]);
        let query = MERC.extrapolate(MERC.extrapolate(line[1], 200.0, MERC.bearing(line[1], line[2])), 10.0, PI);
        let (along, off) = MERC.project_onto_line(query, &line).unwrap();
        assert!((along - (first_leg + 200.0)).abs() < 0.5, "along {along}");
        assert!((off - 10.0).abs() < 0.5, "off {off}");
    }

    #[test]
    fn planar_search_rect_covers_radius() {
        let o = MERC.project(c(6.1, 49.6));
        let rect = MERC.search_rect(o, 100.0);
        for az in [0.0, FRAC_PI_2, PI, -FRAC_PI_2] {
            let p = MERC.extrapolate(o, 99.0, az);
            assert!(p.lon >= rect.min().x && p.lon <= rect.max().x);
            assert!(p.lat >= rect.min().y && p.lat <= rect.max().y);
        }
    }

    #[test]
    fn buffer_in_web_mercator_uses_ground_radius() {
        let source = vec![c(6.10, 49.60), c(6.11, 49.60), c(6.11, 49.605)];
        let b = Buffer::around_in(MERC, &projected(&source), 20.0).unwrap();
        assert_eq!(b.crs(), MERC);
        assert!(b.contains_line(&projected(&source)));

        let shifted: Vec<Coordinates> =
            vec![c(6.101, 49.60), c(6.109, 49.60)].into_iter().map(|p| extrapolate(p, 15.0, 0.0)).collect();
        assert!(b.contains_line(&projected(&shifted)));
        let far: Vec<Coordinates> = shifted.iter().map(|&p| extrapolate(p, 30.0, 0.0)).collect();
        assert!(!b.intersects_line(&projected(&far)));

        let first_leg = projected(&source[..2]);
        let inside = b.intersection_length(&first_leg);
        assert!((inside - MERC.line_string_length(&first_leg)).abs() < 1e-3);
    }
}

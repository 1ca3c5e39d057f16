//! Unit tests for tn-zones.

#[cfg(test)]
mod helpers {
    use geo::{LineString, MultiPolygon, Polygon};
    use tn_core::ZoneId;

    use crate::Zone;

    /// Axis-aligned square zone `[x0, x1] × [y0, y1]`.
    pub fn square(id: u32, x0: f64, y0: f64, x1: f64, y1: f64) -> Zone {
        let ring = LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
        Zone { id: ZoneId(id), polygon: MultiPolygon::new(vec![Polygon::new(ring, vec![])]) }
    }

    /// GeoJSON FeatureCollection text from feature snippets and an optional
    /// legacy `crs` name.
    pub fn collection(crs: Option<&str>, features: &[String]) -> String {
        let crs = crs
            .map(|name| format!(r#""crs": {{"type": "name", "properties": {{"name": "{name}"}}}},"#))
            .unwrap_or_default();
        format!(r#"{{"type": "FeatureCollection", {crs} "features": [{}]}}"#, features.join(","))
    }

    pub fn polygon_feature(location_id: &str, ring: &[(f64, f64)]) -> String {
        let coords: Vec<String> = ring.iter().map(|(x, y)| format!("[{x}, {y}]")).collect();
        format!(
            r#"{{"type": "Feature", "properties": {{"LocationID": {location_id}, "zone": "z"}},
                "geometry": {{"type": "Polygon", "coordinates": [[{}]]}}}}"#,
            coords.join(",")
        )
    }

    pub fn unit_ring(x0: f64, y0: f64, size: f64) -> Vec<(f64, f64)> {
        vec![(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size), (x0, y0)]
    }
}

// ── CRS ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod crs {
    use approx::assert_abs_diff_eq;
    use tn_core::GeoPoint;

    use crate::crs::{NY_LONG_ISLAND, t};
    use crate::{Crs, ZoneError, reproject_points};

    #[test]
    fn names() {
        assert_eq!(Crs::from_name("EPSG:4326").unwrap(), Crs::Wgs84);
        assert_eq!(Crs::from_name("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(), Crs::Wgs84);
        assert_eq!(Crs::from_name("epsg:3857").unwrap(), Crs::WebMercator);
        assert_eq!(Crs::from_name("urn:ogc:def:crs:EPSG::2263").unwrap(), Crs::NyLongIsland);
        assert_eq!(Crs::from_name("2263").unwrap(), Crs::NyLongIsland);
        assert!(matches!(Crs::from_name("EPSG:32618"), Err(ZoneError::UnsupportedCrs(_))));
    }

    #[test]
    fn wgs84_is_identity() {
        assert_eq!(Crs::Wgs84.to_wgs84(-73.9, 40.7), GeoPoint::new(-73.9, 40.7));
    }

    #[test]
    fn web_mercator_inverse() {
        let r = 6_378_137.0_f64;
        let origin = Crs::WebMercator.to_wgs84(0.0, 0.0);
        assert_abs_diff_eq!(origin.lon, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(origin.lat, 0.0, epsilon = 1e-12);

        let phi = 45.0_f64.to_radians();
        let y = r * (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln();
        let p = Crs::WebMercator.to_wgs84(r * std::f64::consts::PI / 2.0, y);
        assert_abs_diff_eq!(p.lon, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.lat, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn ny_long_island_origin() {
        // False easting 300 000 m = 984 250 ftUS, false northing 0.
        let p = Crs::NyLongIsland.to_wgs84(984_250.0, 0.0);
        assert_abs_diff_eq!(p.lon, -74.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.lat, 40.0 + 10.0 / 60.0, epsilon = 1e-9);
    }

    #[test]
    fn ny_long_island_midtown() {
        // Empire State Building is at roughly (988 000, 212 000) ftUS.
        let p = Crs::NyLongIsland.to_wgs84(988_000.0, 212_000.0);
        assert_abs_diff_eq!(p.lon, -73.9857, epsilon = 2e-3);
        assert_abs_diff_eq!(p.lat, 40.7484, epsilon = 2e-3);
    }

    /// Forward LCC so the inverse can be checked away from the origin.
    fn forward(lon: f64, lat: f64) -> (f64, f64) {
        let c = NY_LONG_ISLAND.constants();
        let rho = c.a_f * t(lat.to_radians(), c.e).powf(c.n);
        let theta = c.n * (lon - NY_LONG_ISLAND.lon_0).to_radians();
        let x = NY_LONG_ISLAND.false_east + rho * theta.sin();
        let y = NY_LONG_ISLAND.false_north + c.rho_0 - rho * theta.cos();
        let ft = 1200.0 / 3937.0;
        (x / ft, y / ft)
    }

    #[test]
    fn ny_long_island_round_trip() {
        for (lon, lat) in [(-74.02, 40.70), (-73.93, 40.80), (-73.75, 40.60), (-74.20, 40.55)] {
            let (x, y) = forward(lon, lat);
            let back = Crs::NyLongIsland.to_wgs84(x, y);
            assert_abs_diff_eq!(back.lon, lon, epsilon = 1e-9);
            assert_abs_diff_eq!(back.lat, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn reproject_node_positions() {
        let mut pts = vec![GeoPoint::new(984_250.0, 0.0)];
        reproject_points(&mut pts, Crs::NyLongIsland);
        assert_abs_diff_eq!(pts[0].lon, -74.0, epsilon = 1e-9);

        let mut untouched = vec![GeoPoint::new(1.5, 2.5)];
        reproject_points(&mut untouched, Crs::Wgs84);
        assert_eq!(untouched[0], GeoPoint::new(1.5, 2.5));
    }
}

// ── GeoJSON loading ───────────────────────────────────────────────────────────

#[cfg(test)]
mod loading {
    use approx::assert_abs_diff_eq;
    use geo::BoundingRect;
    use tn_core::ZoneId;

    use super::helpers::{collection, polygon_feature, unit_ring};
    use crate::{Crs, ZoneError, load_zones_geojson, parse_zones_geojson};

    #[test]
    fn polygon_and_multipolygon() {
        let multi = r#"{"type": "Feature", "properties": {"LocationID": 9},
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0,0],[1,0],[1,1],[0,1],[0,0]]],
                [[[5,5],[6,5],[6,6],[5,6],[5,5]]]]}}"#
            .to_owned();
        let text = collection(None, &[polygon_feature("4", &unit_ring(2.0, 2.0, 1.0)), multi]);
        let zones = parse_zones_geojson(&text, None).unwrap();

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, ZoneId(4));
        assert_eq!(zones[0].polygon.0.len(), 1);
        assert_eq!(zones[1].id, ZoneId(9));
        assert_eq!(zones[1].polygon.0.len(), 2);
    }

    #[test]
    fn location_id_variants() {
        let text = collection(None, &[
            polygon_feature("\"12\"", &unit_ring(0.0, 0.0, 1.0)),
            polygon_feature("13.0", &unit_ring(0.0, 0.0, 1.0)),
        ]);
        let zones = parse_zones_geojson(&text, None).unwrap();
        assert_eq!(zones[0].id, ZoneId(12));
        assert_eq!(zones[1].id, ZoneId(13));
    }

    #[test]
    fn duplicate_location_ids_are_kept() {
        let text = collection(None, &[
            polygon_feature("56", &unit_ring(0.0, 0.0, 1.0)),
            polygon_feature("56", &unit_ring(3.0, 0.0, 1.0)),
        ]);
        let zones = parse_zones_geojson(&text, None).unwrap();
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.id == ZoneId(56)));
    }

    #[test]
    fn declared_crs_is_applied() {
        let ring = [(984_250.0, 0.0), (985_250.0, 0.0), (985_250.0, 1000.0), (984_250.0, 0.0)];
        let text = collection(Some("urn:ogc:def:crs:EPSG::2263"), &[polygon_feature("1", &ring)]);
        let zones = parse_zones_geojson(&text, None).unwrap();
        let rect = zones[0].polygon.bounding_rect().unwrap();
        assert_abs_diff_eq!(rect.min().x, -74.0, epsilon = 1e-9);
        assert!(rect.max().x > -74.0 && rect.max().x < -73.99);
    }

    #[test]
    fn override_beats_declared_crs() {
        let text = collection(Some("EPSG:2263"), &[polygon_feature("1", &unit_ring(1.0, 1.0, 1.0))]);
        let zones = parse_zones_geojson(&text, Some(Crs::Wgs84)).unwrap();
        let rect = zones[0].polygon.bounding_rect().unwrap();
        assert_eq!(rect.min().x, 1.0);
    }

    #[test]
    fn unknown_declared_crs_is_rejected() {
        let text = collection(Some("EPSG:27700"), &[polygon_feature("1", &unit_ring(0.0, 0.0, 1.0))]);
        let err = parse_zones_geojson(&text, None).unwrap_err();
        assert!(matches!(err, ZoneError::UnsupportedCrs(_)));
    }

    #[test]
    fn missing_location_id() {
        let text = collection(None, &[r#"{"type": "Feature", "properties": {"zone": "x"},
            "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}"#
            .to_owned()]);
        let err = parse_zones_geojson(&text, None).unwrap_err();
        assert!(matches!(err, ZoneError::MissingLocationId { feature: 0 }));
    }

    #[test]
    fn invalid_location_id() {
        for bad in ["-3", "1.5", "\"abc\"", "null"] {
            let text = collection(None, &[polygon_feature(bad, &unit_ring(0.0, 0.0, 1.0))]);
            let err = parse_zones_geojson(&text, None).unwrap_err();
            assert!(matches!(err, ZoneError::InvalidLocationId { feature: 0, .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn point_geometry_is_rejected() {
        let text = collection(None, &[r#"{"type": "Feature", "properties": {"LocationID": 1},
            "geometry": {"type": "Point", "coordinates": [0, 0]}}"#
            .to_owned()]);
        let err = parse_zones_geojson(&text, None).unwrap_err();
        assert!(matches!(err, ZoneError::UnsupportedGeometry { kind, .. } if kind == "Point"));
    }

    #[test]
    fn not_geojson_is_load_error() {
        assert!(matches!(parse_zones_geojson("{ nope", None), Err(ZoneError::GeoJson(_))));
        let bare = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(parse_zones_geojson(bare, None), Err(ZoneError::GeoJson(_))));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("zones.geojson");
        std::fs::write(&path, collection(None, &[polygon_feature("7", &unit_ring(0.0, 0.0, 1.0))]))
            .unwrap();
        let zones = load_zones_geojson(&path, None).unwrap();
        assert_eq!(zones[0].id, ZoneId(7));

        let err = load_zones_geojson(&dir.path().join("missing.geojson"), None).unwrap_err();
        assert!(matches!(err, ZoneError::Io(_)));
    }
}

// ── Spatial join ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod join {
    use geo::{LineString, MultiPolygon, Polygon};
    use tn_core::{GeoPoint, NodeIdx, ZoneId};

    use super::helpers::square;
    use crate::{Zone, ZoneIndex, assign_nodes};

    fn pt(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat)
    }

    #[test]
    fn locate_inside_and_outside() {
        let index = ZoneIndex::new(vec![square(1, 0.0, 0.0, 1.0, 1.0), square(2, 2.0, 0.0, 3.0, 1.0)]);
        assert_eq!(index.locate(pt(0.5, 0.5)), Some(ZoneId(1)));
        assert_eq!(index.locate(pt(2.5, 0.5)), Some(ZoneId(2)));
        assert_eq!(index.locate(pt(1.5, 0.5)), None);
        assert_eq!(index.locate(pt(9.0, 9.0)), None);
        assert_eq!(index.len(), 2);
        assert_eq!(index.zones().iter().map(|z| z.id).collect::<Vec<_>>(), [ZoneId(1), ZoneId(2)]);
    }

    #[test]
    fn boundary_is_outside() {
        let index = ZoneIndex::new(vec![square(1, 0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(index.locate(pt(1.0, 0.5)), None);
        assert_eq!(index.locate(pt(0.0, 0.0)), None);
    }

    #[test]
    fn hole_is_outside() {
        let outer = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)]);
        let zone = Zone { id: ZoneId(5), polygon: MultiPolygon::new(vec![Polygon::new(outer, vec![hole])]) };
        let index = ZoneIndex::new(vec![zone]);
        assert_eq!(index.locate(pt(2.0, 2.0)), None);
        assert_eq!(index.locate(pt(0.5, 2.0)), Some(ZoneId(5)));
    }

    #[test]
    fn overlap_resolves_to_smallest_id() {
        let index = ZoneIndex::new(vec![square(30, 0.0, 0.0, 2.0, 2.0), square(7, 1.0, 1.0, 3.0, 3.0)]);
        assert_eq!(index.locate(pt(1.5, 1.5)), Some(ZoneId(7)));
        assert_eq!(index.locate(pt(0.5, 0.5)), Some(ZoneId(30)));
    }

    #[test]
    fn assign_groups_nodes_by_zone() {
        let index = ZoneIndex::new(vec![
            square(1, 0.0, 0.0, 1.0, 1.0),
            square(2, 2.0, 0.0, 3.0, 1.0),
            square(3, 5.0, 5.0, 6.0, 6.0),
        ]);
        let nodes = vec![
            (NodeIdx(0), pt(0.2, 0.2)),
            (NodeIdx(1), pt(2.5, 0.5)),
            (NodeIdx(2), pt(0.8, 0.8)),
            (NodeIdx(3), pt(9.0, 9.0)),
        ];
        let (table, report) = assign_nodes(&index, nodes);

        assert_eq!(table.nodes_in(ZoneId(1)), Some(&[NodeIdx(0), NodeIdx(2)][..]));
        assert_eq!(table.nodes_in(ZoneId(2)), Some(&[NodeIdx(1)][..]));
        assert_eq!(table.nodes_in(ZoneId(3)), None);
        assert_eq!(table.zone_count(), 2);
        assert_eq!(table.node_count(), 3);

        assert_eq!(report.nodes_total, 4);
        assert_eq!(report.nodes_assigned(), 3);
        assert_eq!(report.unassigned, vec![NodeIdx(3)]);
        assert_eq!(report.empty_zones, vec![ZoneId(3)]);
    }

    #[test]
    fn split_zone_collects_both_parts() {
        let index = ZoneIndex::new(vec![square(56, 0.0, 0.0, 1.0, 1.0), square(56, 4.0, 0.0, 5.0, 1.0)]);
        let (table, report) =
            assign_nodes(&index, vec![(NodeIdx(0), pt(0.5, 0.5)), (NodeIdx(1), pt(4.5, 0.5))]);
        assert_eq!(table.nodes_in(ZoneId(56)), Some(&[NodeIdx(0), NodeIdx(1)][..]));
        assert!(report.empty_zones.is_empty());
    }

    #[test]
    fn every_node_in_at_most_one_zone() {
        let index = ZoneIndex::new(vec![
            square(1, 0.0, 0.0, 2.0, 2.0),
            square(2, 1.0, 1.0, 3.0, 3.0),
            square(3, 0.5, 0.5, 2.5, 2.5),
        ]);
        let nodes: Vec<_> = (0..30u32)
            .map(|i| (NodeIdx(i), pt(0.1 * i as f64, 0.1 * i as f64 + 0.05)))
            .collect();
        let (table, report) = assign_nodes(&index, nodes);
        let mut seen: Vec<NodeIdx> = table.iter().flat_map(|(_, n)| n.iter().copied()).collect();
        seen.extend(&report.unassigned);
        seen.sort();
        assert_eq!(seen, (0..30).map(NodeIdx).collect::<Vec<_>>());
    }
}

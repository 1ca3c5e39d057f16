//! Unit tests for tn-trips.

#[cfg(test)]
mod helpers {
    use chrono::NaiveDateTime;
    use tn_core::time::parse_datetime;
    use tn_core::{GeoPoint, NodeIdx, ZoneId};
    use tn_graph::{NodeTable, StreetNetworkBuilder};
    use tn_zones::NodeZoneTable;

    use crate::TripRecord;

    pub fn dt(text: &str) -> NaiveDateTime {
        parse_datetime(text).unwrap()
    }

    /// Six nodes with osmid `1000 + idx`.
    pub fn node_table() -> NodeTable {
        let mut b = StreetNetworkBuilder::new();
        for i in 0..6 {
            b.add_node(format!("n{i}"), GeoPoint::new(0.0, 0.0), 1000 + i).unwrap();
        }
        b.build().node_table()
    }

    /// Zone 1 → nodes 0..3, zone 2 → nodes 3..5, zone 3 → node 5.
    pub fn zone_table() -> NodeZoneTable {
        [(1, 0), (1, 1), (1, 2), (2, 3), (2, 4), (3, 5)]
            .into_iter()
            .map(|(z, n)| (ZoneId(z), NodeIdx(n)))
            .collect()
    }

    pub fn trip(pickup: Option<u32>, dropoff: Option<u32>) -> TripRecord {
        TripRecord {
            pickup_datetime:  dt("2024-09-01 00:05:51"),
            dropoff_datetime: dt("2024-09-01 00:20:10"),
            pickup_zone:      pickup.map(ZoneId),
            dropoff_zone:     dropoff.map(ZoneId),
            passenger_count:  Some(1.0),
            trip_distance:    2.5,
            fare_amount:      14.2,
        }
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_loading {
    use std::io::Cursor;

    use tn_core::ZoneId;

    use super::helpers::dt;
    use crate::{TripError, load_trips, read_trips_csv_reader};

    const HEADER: &str = "VendorID,tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,\
                          trip_distance,PULocationID,DOLocationID,fare_amount\n";

    fn csv(rows: &[&str]) -> String {
        let mut text = HEADER.to_owned();
        for r in rows {
            text.push_str(r);
            text.push('\n');
        }
        text
    }

    #[test]
    fn reads_columns_by_name() {
        let text = csv(&[
            "2,2024-09-01 00:05:51,2024-09-01 00:20:10,1,2.5,4,79,14.2",
            "1,2024-09-01 01:00:00.250,2024-09-01 01:10:00,,0.9,132.0,,6.5",
        ]);
        let trips = read_trips_csv_reader(Cursor::new(text), None).unwrap();
        assert_eq!(trips.len(), 2);

        assert_eq!(trips[0].pickup_datetime, dt("2024-09-01 00:05:51"));
        assert_eq!(trips[0].pickup_zone, Some(ZoneId(4)));
        assert_eq!(trips[0].dropoff_zone, Some(ZoneId(79)));
        assert_eq!(trips[0].passenger_count, Some(1.0));
        assert_eq!(trips[0].trip_distance, 2.5);
        assert_eq!(trips[0].fare_amount, 14.2);

        assert_eq!(trips[1].pickup_datetime, dt("2024-09-01 01:00:00.250"));
        assert_eq!(trips[1].pickup_zone, Some(ZoneId(132)));
        assert_eq!(trips[1].dropoff_zone, None);
        assert_eq!(trips[1].passenger_count, None);
    }

    #[test]
    fn limit_keeps_first_rows() {
        let text = csv(&[
            "1,2024-09-01 00:00:01,2024-09-01 00:10:00,1,1,4,4,5",
            "1,2024-09-01 00:00:02,2024-09-01 00:10:00,1,1,4,4,5",
            "1,2024-09-01 00:00:03,2024-09-01 00:10:00,1,1,4,4,5",
        ]);
        let trips = read_trips_csv_reader(Cursor::new(text), Some(2)).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[1].pickup_datetime, dt("2024-09-01 00:00:02"));
    }

    #[test]
    fn missing_column() {
        let text = "tpep_pickup_datetime,tpep_dropoff_datetime,PULocationID,DOLocationID\n";
        let err = read_trips_csv_reader(Cursor::new(text), None).unwrap_err();
        assert!(matches!(err, TripError::MissingColumn("passenger_count")), "got {err}");
    }

    #[test]
    fn bad_timestamp_names_row_and_column() {
        let text = csv(&[
            "1,2024-09-01 00:00:01,2024-09-01 00:10:00,1,1,4,4,5",
            "1,2024-09-01 00:00:02,yesterday,1,1,4,4,5",
        ]);
        let err = read_trips_csv_reader(Cursor::new(text), None).unwrap_err();
        match err {
            TripError::InvalidTimestamp { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "tpep_dropoff_datetime");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn non_numeric_field_is_csv_error() {
        let text = csv(&["1,2024-09-01 00:00:01,2024-09-01 00:10:00,one,1,4,4,5"]);
        let err = read_trips_csv_reader(Cursor::new(text), None).unwrap_err();
        assert!(matches!(err, TripError::Csv(_)));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("trips.CSV");
        std::fs::write(&path, csv(&["1,2024-09-01 00:00:01,2024-09-01 00:10:00,1,1,4,4,5"])).unwrap();
        assert_eq!(load_trips(&path, None).unwrap().len(), 1);

        let other = dir.path().join("trips.json");
        std::fs::write(&other, "[]").unwrap();
        assert!(matches!(load_trips(&other, None), Err(TripError::UnsupportedFormat(_))));

        let missing = dir.path().join("none.csv");
        assert!(matches!(load_trips(&missing, None), Err(TripError::Io(_))));
    }
}

// ── Parquet loading ───────────────────────────────────────────────────────────

#[cfg(all(test, feature = "parquet"))]
mod parquet_loading {
    use std::fs::File;
    use std::path::Path;
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampNanosecondArray};
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tn_core::ZoneId;
    use tn_core::time::epoch_micros;

    use super::helpers::dt;
    use crate::{TripError, load_trips, read_trips_parquet};

    /// TLC-style file: ns timestamps, int32 zones, nullable int64 passengers,
    /// plus a column the reader must ignore.
    fn write_sample(path: &Path, with_fare: bool) {
        let ns = |s: &str| epoch_micros(dt(s)) * 1000;
        let mut fields = vec![
            Field::new("tpep_pickup_datetime", DataType::Timestamp(TimeUnit::Nanosecond, None), true),
            Field::new("tpep_dropoff_datetime", DataType::Timestamp(TimeUnit::Nanosecond, None), true),
            Field::new("passenger_count", DataType::Int64, true),
            Field::new("trip_distance", DataType::Float64, true),
            Field::new("PULocationID", DataType::Int32, true),
            Field::new("DOLocationID", DataType::Int32, true),
            Field::new("store_and_fwd_flag", DataType::Utf8, true),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(TimestampNanosecondArray::from(vec![
                ns("2024-09-01 00:05:51"),
                ns("2024-09-01 00:06:00"),
                ns("2024-09-01 00:07:00"),
            ])),
            Arc::new(TimestampNanosecondArray::from(vec![
                ns("2024-09-01 00:20:10"),
                ns("2024-09-01 00:30:00"),
                ns("2024-09-01 00:40:00"),
            ])),
            Arc::new(Int64Array::from(vec![Some(2), None, Some(1)])),
            Arc::new(Float64Array::from(vec![3.1, 0.4, 7.0])),
            Arc::new(Int32Array::from(vec![Some(4), None, Some(132)])),
            Arc::new(Int32Array::from(vec![79, 4, 236])),
            Arc::new(StringArray::from(vec!["N", "N", "Y"])),
        ];
        if with_fare {
            fields.push(Field::new("fare_amount", DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(vec![Some(17.0), None, Some(30.5)])));
        }
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(Arc::clone(&schema), columns).unwrap();
        let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn reads_and_normalises_types() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("trips.parquet");
        write_sample(&path, true);

        let trips = read_trips_parquet(&path, None).unwrap();
        assert_eq!(trips.len(), 3);
        assert_eq!(trips[0].pickup_datetime, dt("2024-09-01 00:05:51"));
        assert_eq!(trips[0].dropoff_datetime, dt("2024-09-01 00:20:10"));
        assert_eq!(trips[0].pickup_zone, Some(ZoneId(4)));
        assert_eq!(trips[0].dropoff_zone, Some(ZoneId(79)));
        assert_eq!(trips[0].passenger_count, Some(2.0));
        assert_eq!(trips[0].trip_distance, 3.1);
        assert_eq!(trips[0].fare_amount, 17.0);

        assert_eq!(trips[1].pickup_zone, None);
        assert_eq!(trips[1].passenger_count, None);
        assert!(trips[1].fare_amount.is_nan());
        assert_eq!(trips[2].pickup_zone, Some(ZoneId(132)));
    }

    #[test]
    fn limit_and_dispatch() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("trips.parquet");
        write_sample(&path, true);
        let trips = load_trips(&path, Some(2)).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[1].pickup_datetime, dt("2024-09-01 00:06:00"));
    }

    #[test]
    fn missing_column() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("trips.parquet");
        write_sample(&path, false);
        let err = read_trips_parquet(&path, None).unwrap_err();
        assert!(matches!(err, TripError::MissingColumn("fare_amount")), "got {err}");
    }

    #[test]
    fn not_parquet_is_load_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("trips.parquet");
        std::fs::write(&path, b"definitely not parquet").unwrap();
        assert!(matches!(read_trips_parquet(&path, None), Err(TripError::Parquet(_))));
    }
}

// ── Mapping ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod mapping {
    use std::collections::BTreeSet;

    use tn_core::{NodeIdx, ZoneId};
    use tn_zones::NodeZoneTable;

    use super::helpers::{node_table, trip, zone_table};
    use crate::{MappedTrip, TripError, TripRecord, map_trip, map_trips};

    fn many_trips(n: usize) -> Vec<TripRecord> {
        (0..n)
            .map(|i| {
                let pickup = [Some(1), Some(2), Some(3), Some(9), None][i % 5];
                let dropoff = [Some(2), Some(1), Some(1), Some(3)][i % 4];
                trip(pickup, dropoff)
            })
            .collect()
    }

    #[test]
    fn fields_are_carried_over() {
        let (mapped, report) = map_trips(&[trip(Some(3), Some(3))], &zone_table(), &node_table(), 0).unwrap();
        assert_eq!(report.trips_mapped, 1);
        let m = &mapped[0];
        // Zone 3 has exactly one node.
        assert_eq!(m.pickup_idx, NodeIdx(5));
        assert_eq!(m.dropoff_idx, NodeIdx(5));
        assert_eq!(m.pickup_osmid, 1005);
        assert_eq!(m.t, 1_725_149_151); // 2024-09-01 00:05:51 UTC
        assert_eq!(m.passenger_count, Some(1.0));
        assert_eq!(m.trip_distance, 2.5);
        assert_eq!(m.fare_amount, 14.2);
    }

    #[test]
    fn samples_stay_inside_their_zone() {
        let zones = zone_table();
        let trips = many_trips(200);
        let (mapped, _) = map_trips(&trips, &zones, &node_table(), 17).unwrap();
        let in_zone = |z: u32, n: NodeIdx| zones.nodes_in(ZoneId(z)).unwrap().contains(&n);

        let mut mapped_iter = mapped.iter();
        for t in &trips {
            let (Some(p), Some(d)) = (t.pickup_zone, t.dropoff_zone) else { continue };
            if !zones.contains_zone(p) || !zones.contains_zone(d) {
                continue;
            }
            let m = mapped_iter.next().unwrap();
            assert!(in_zone(p.0, m.pickup_idx));
            assert!(in_zone(d.0, m.dropoff_idx));
        }
        assert!(mapped_iter.next().is_none());
    }

    #[test]
    fn every_zone_node_gets_sampled() {
        let trips: Vec<_> = (0..300).map(|_| trip(Some(1), Some(2))).collect();
        let (mapped, _) = map_trips(&trips, &zone_table(), &node_table(), 3).unwrap();
        let pickups: BTreeSet<NodeIdx> = mapped.iter().map(|m| m.pickup_idx).collect();
        let dropoffs: BTreeSet<NodeIdx> = mapped.iter().map(|m| m.dropoff_idx).collect();
        assert_eq!(pickups, [0, 1, 2].into_iter().map(NodeIdx).collect::<BTreeSet<_>>());
        assert_eq!(dropoffs, [3, 4].into_iter().map(NodeIdx).collect::<BTreeSet<_>>());
    }

    #[test]
    fn unmappable_trips_are_dropped_and_counted() {
        let trips = vec![
            trip(Some(1), Some(2)),
            trip(Some(9), Some(2)),  // pickup zone without nodes
            trip(Some(1), None),     // null dropoff
            trip(None, Some(77)),    // both ends unmapped
            trip(Some(3), Some(1)),
        ];
        let (mapped, report) = map_trips(&trips, &zone_table(), &node_table(), 5).unwrap();

        assert_eq!(mapped.len(), 2);
        assert_eq!(report.trips_in, 5);
        assert_eq!(report.trips_mapped, 2);
        assert_eq!(report.trips_dropped(), 3);
        assert_eq!(report.unmapped_pickup, 2);
        assert_eq!(report.unmapped_dropoff, 2);
        assert_eq!(report.missing_zones, [9, 77].into_iter().map(ZoneId).collect::<BTreeSet<_>>());
        assert_eq!(mapped[1].pickup_idx, NodeIdx(5));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let trips = many_trips(100);
        let a = map_trips(&trips, &zone_table(), &node_table(), 42).unwrap();
        let b = map_trips(&trips, &zone_table(), &node_table(), 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seed_changes_samples() {
        let trips: Vec<_> = (0..50).map(|_| trip(Some(1), Some(1))).collect();
        let (a, _) = map_trips(&trips, &zone_table(), &node_table(), 1).unwrap();
        let (b, _) = map_trips(&trips, &zone_table(), &node_table(), 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn batch_matches_row_by_row_in_any_order() {
        let trips = many_trips(120);
        let (zones, nodes) = (zone_table(), node_table());
        let (batch, _) = map_trips(&trips, &zones, &nodes, 9).unwrap();

        let mut reversed: Vec<Option<MappedTrip>> = (0..trips.len())
            .rev()
            .map(|row| map_trip(row, &trips[row], &zones, &nodes, 9).unwrap())
            .collect();
        reversed.reverse();
        let row_by_row: Vec<MappedTrip> = reversed.into_iter().flatten().collect();

        assert_eq!(batch, row_by_row);
    }

    #[test]
    fn truncated_input_samples_identically() {
        let trips = many_trips(80);
        let (full, _) = map_trips(&trips, &zone_table(), &node_table(), 11).unwrap();
        let (head, _) = map_trips(&trips[..40], &zone_table(), &node_table(), 11).unwrap();
        assert_eq!(&full[..head.len()], &head[..]);
    }

    #[test]
    fn zone_table_from_other_graph_is_index_error() {
        let zones: NodeZoneTable = [(ZoneId(1), NodeIdx(40))].into_iter().collect();
        let err = map_trips(&[trip(Some(1), Some(1))], &zones, &node_table(), 0).unwrap_err();
        assert!(matches!(err, TripError::NodeNotFound { zone: ZoneId(1), idx: NodeIdx(40) }));
    }

    #[test]
    fn empty_input() {
        let (mapped, report) = map_trips(&[], &zone_table(), &node_table(), 0).unwrap();
        assert!(mapped.is_empty());
        assert_eq!(report.trips_dropped(), 0);
    }
}

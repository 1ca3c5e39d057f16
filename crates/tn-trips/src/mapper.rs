//! Zone → node sampling for trip endpoints.
//!
//! # Determinism
//!
//! Row `r` draws from `RowRng::new(seed, r)`: first the pickup node, then the
//! dropoff node.  No RNG state is shared between rows, so the output is the
//! same whether rows are processed in order, in reverse, or split across
//! Rayon workers.  Repeated zone ids on different rows sample independently.

use std::collections::BTreeSet;

use log::{info, warn};

use tn_core::time::epoch_seconds;
use tn_core::{NodeIdx, RowRng, ZoneId};
use tn_graph::NodeTable;
use tn_zones::NodeZoneTable;

use crate::record::{MappedTrip, TripRecord};
use crate::{TripError, TripResult};

/// Max zone ids listed in a data-quality warning.
const REPORT_EXAMPLES: usize = 20;

/// Counts from one [`map_trips`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapReport {
    pub trips_in:         usize,
    pub trips_mapped:     usize,
    /// Trips whose pickup zone has no node (or is null).
    pub unmapped_pickup:  usize,
    /// Trips whose dropoff zone has no node (or is null).
    pub unmapped_dropoff: usize,
    /// Non-null zone ids referenced by trips but absent from the zone table.
    pub missing_zones:    BTreeSet<ZoneId>,
}

impl MapReport {
    pub fn trips_dropped(&self) -> usize {
        self.trips_in - self.trips_mapped
    }

    /// Log dropped-trip counts and example zone ids at `warn`.
    pub fn log_warnings(&self) {
        if self.trips_dropped() == 0 {
            return;
        }
        let examples: Vec<ZoneId> = self.missing_zones.iter().copied().take(REPORT_EXAMPLES).collect();
        warn!(
            "dropped {} of {} trips ({} unmapped pickups, {} unmapped dropoffs); zones without nodes include {:?}",
            self.trips_dropped(),
            self.trips_in,
            self.unmapped_pickup,
            self.unmapped_dropoff,
            examples,
        );
    }
}

/// Map every trip to a pickup and a dropoff node.
///
/// Trips with either end outside the zone table are left out; the rest keep
/// their input order.
///
/// # Errors
///
/// [`TripError::NodeNotFound`] if `zones` lists an index that `nodes` does
/// not contain, meaning the zone table was built against another node table.
pub fn map_trips(
    trips: &[TripRecord],
    zones: &NodeZoneTable,
    nodes: &NodeTable,
    seed:  u64,
) -> TripResult<(Vec<MappedTrip>, MapReport)> {
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Option<MappedTrip>> = trips
        .iter()
        .enumerate()
        .map(|(row, trip)| map_trip(row, trip, zones, nodes, seed))
        .collect::<TripResult<_>>()?;

    #[cfg(feature = "parallel")]
    let rows: Vec<Option<MappedTrip>> = {
        use rayon::prelude::*;
        trips
            .par_iter()
            .enumerate()
            .map(|(row, trip)| map_trip(row, trip, zones, nodes, seed))
            .collect::<TripResult<_>>()?
    };

    let report = summarize(trips, zones, &rows);
    info!(
        "trip mapping: {} of {} trips mapped to nodes",
        report.trips_mapped, report.trips_in
    );

    Ok((rows.into_iter().flatten().collect(), report))
}

/// Map a single trip at position `row` of the input.
///
/// Returns `Ok(None)` when the pickup or dropoff zone has no node.
pub fn map_trip(
    row:   usize,
    trip:  &TripRecord,
    zones: &NodeZoneTable,
    nodes: &NodeTable,
    seed:  u64,
) -> TripResult<Option<MappedTrip>> {
    let mut rng = RowRng::new(seed, row as u64);
    let pickup = sample(trip.pickup_zone, zones, &mut rng);
    let dropoff = sample(trip.dropoff_zone, zones, &mut rng);

    let (Some((pickup_zone, pickup_idx)), Some((dropoff_zone, dropoff_idx))) = (pickup, dropoff) else {
        return Ok(None);
    };

    Ok(Some(MappedTrip {
        t:                epoch_seconds(trip.pickup_datetime),
        pickup_datetime:  trip.pickup_datetime,
        dropoff_datetime: trip.dropoff_datetime,
        passenger_count:  trip.passenger_count,
        trip_distance:    trip.trip_distance,
        pickup_osmid:     osmid(nodes, pickup_zone, pickup_idx)?,
        dropoff_osmid:    osmid(nodes, dropoff_zone, dropoff_idx)?,
        pickup_idx,
        dropoff_idx,
        fare_amount:      trip.fare_amount,
    }))
}

fn sample(zone: Option<ZoneId>, zones: &NodeZoneTable, rng: &mut RowRng) -> Option<(ZoneId, NodeIdx)> {
    let zone = zone?;
    let &node = rng.choose(zones.nodes_in(zone)?)?;
    Some((zone, node))
}

fn osmid(nodes: &NodeTable, zone: ZoneId, idx: NodeIdx) -> TripResult<i64> {
    nodes
        .get(idx)
        .map(|r| r.osmid)
        .ok_or(TripError::NodeNotFound { zone, idx })
}

fn summarize(trips: &[TripRecord], zones: &NodeZoneTable, rows: &[Option<MappedTrip>]) -> MapReport {
    let mut report = MapReport {
        trips_in: trips.len(),
        trips_mapped: rows.iter().filter(|r| r.is_some()).count(),
        ..MapReport::default()
    };
    for trip in trips {
        for (zone, counter) in [
            (trip.pickup_zone, &mut report.unmapped_pickup),
            (trip.dropoff_zone, &mut report.unmapped_dropoff),
        ] {
            match zone {
                Some(z) if zones.contains_zone(z) => {}
                Some(z) => {
                    *counter += 1;
                    report.missing_zones.insert(z);
                }
                None => *counter += 1,
            }
        }
    }
    report
}

//! Geographic coordinate type.
//!
//! `GeoPoint` uses `f64` longitude/latitude.  Zone polygons are tested for
//! point containment near their boundaries, where single precision (~1 m)
//! would flip results for nodes sitting on a street centreline that also
//! forms the zone edge.

/// A WGS-84 geographic coordinate in degrees.
///
/// Field order is `(lon, lat)` to match GraphML `x`/`y` and GeoJSON positions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `true` if both components are finite numbers.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

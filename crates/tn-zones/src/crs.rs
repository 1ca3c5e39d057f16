//! Coordinate reference systems and inverse projections to WGS-84.
//!
//! Only the projections the NYC inputs actually arrive in are supported:
//!
//! | `Crs`            | EPSG      | Units     | Inverse                         |
//! |------------------|-----------|-----------|---------------------------------|
//! | `Wgs84`          | 4326      | degrees   | identity                        |
//! | `WebMercator`    | 3857      | metres    | spherical Mercator, R = 6378137 |
//! | `NyLongIsland`   | 2263      | US feet   | Lambert conformal conic (2SP)   |
//!
//! EPSG:2263 is NAD83 / New York Long Island (ftUS), the native CRS of the
//! TLC taxi-zone shapefile.  NAD83 and WGS-84 differ by well under a metre,
//! so the GRS80 ellipsoid output is used as WGS-84 directly.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use tn_core::GeoPoint;

use crate::{ZoneError, ZoneResult};

/// Supported coordinate reference systems.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Crs {
    #[default]
    Wgs84,
    WebMercator,
    NyLongIsland,
}

impl Crs {
    /// Parse a CRS name as found in a GeoJSON `crs` member or in the config.
    ///
    /// Accepts `EPSG:<code>`, the OGC URN forms
    /// (`urn:ogc:def:crs:EPSG::<code>`, `urn:ogc:def:crs:OGC:1.3:CRS84`) and a
    /// bare numeric code.
    pub fn from_name(name: &str) -> ZoneResult<Crs> {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") || upper == "WGS84" {
            return Ok(Crs::Wgs84);
        }
        let code = upper.rsplit(':').next().unwrap_or_default();
        match code {
            "4326" => Ok(Crs::Wgs84),
            "3857" | "900913" => Ok(Crs::WebMercator),
            "2263" => Ok(Crs::NyLongIsland),
            _ => Err(ZoneError::UnsupportedCrs(name.to_owned())),
        }
    }

    /// Convert a coordinate in this CRS to WGS-84 `(lon, lat)` degrees.
    pub fn to_wgs84(self, x: f64, y: f64) -> GeoPoint {
        match self {
            Crs::Wgs84 => GeoPoint::new(x, y),
            Crs::WebMercator => web_mercator_inverse(x, y),
            Crs::NyLongIsland => NY_LONG_ISLAND.inverse(x * US_SURVEY_FOOT_M, y * US_SURVEY_FOOT_M),
        }
    }
}

/// Reproject node positions declared in `crs` to WGS-84, in place.
pub fn reproject_points(points: &mut [GeoPoint], crs: Crs) {
    if crs == Crs::Wgs84 {
        return;
    }
    for p in points {
        *p = crs.to_wgs84(p.lon, p.lat);
    }
}

// ── Web Mercator ──────────────────────────────────────────────────────────────

const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

fn web_mercator_inverse(x: f64, y: f64) -> GeoPoint {
    let lon = x / WEB_MERCATOR_RADIUS_M;
    let lat = 2.0 * (y / WEB_MERCATOR_RADIUS_M).exp().atan() - FRAC_PI_2;
    GeoPoint::new(lon.to_degrees(), lat.to_degrees())
}

// ── Lambert conformal conic (two standard parallels) ──────────────────────────

const US_SURVEY_FOOT_M: f64 = 1200.0 / 3937.0;

const GRS80_A: f64 = 6_378_137.0;
const GRS80_INV_F: f64 = 298.257_222_101;

/// Ellipsoidal LCC 2SP parameters, all angles in degrees, offsets in metres.
pub(crate) struct LambertConic {
    pub lat_1:       f64,
    pub lat_2:       f64,
    pub lat_0:       f64,
    pub lon_0:       f64,
    pub false_east:  f64,
    pub false_north: f64,
}

/// EPSG:2263.  Standard parallels 41°02′ and 40°40′, origin 40°10′ N 74° W,
/// false easting 300 000 m.
pub(crate) const NY_LONG_ISLAND: LambertConic = LambertConic {
    lat_1:       41.0 + 2.0 / 60.0,
    lat_2:       40.0 + 40.0 / 60.0,
    lat_0:       40.0 + 10.0 / 60.0,
    lon_0:       -74.0,
    false_east:  300_000.0,
    false_north: 0.0,
};

/// Derived cone constants.
pub(crate) struct ConeConstants {
    pub e:     f64,
    pub n:     f64,
    pub a_f:   f64,
    pub rho_0: f64,
}

impl LambertConic {
    pub(crate) fn constants(&self) -> ConeConstants {
        let f = 1.0 / GRS80_INV_F;
        let e = (2.0 * f - f * f).sqrt();

        let phi_1 = self.lat_1.to_radians();
        let phi_2 = self.lat_2.to_radians();
        let phi_0 = self.lat_0.to_radians();

        let m_1 = m(phi_1, e);
        let m_2 = m(phi_2, e);
        let t_1 = t(phi_1, e);
        let t_2 = t(phi_2, e);

        let n = (m_1.ln() - m_2.ln()) / (t_1.ln() - t_2.ln());
        let a_f = GRS80_A * m_1 / (n * t_1.powf(n));
        let rho_0 = a_f * t(phi_0, e).powf(n);
        ConeConstants { e, n, a_f, rho_0 }
    }

    /// Projected metres → geographic degrees.
    fn inverse(&self, x: f64, y: f64) -> GeoPoint {
        let ConeConstants { e, n, a_f, rho_0 } = self.constants();

        let dx = x - self.false_east;
        let dy = rho_0 - (y - self.false_north);
        let rho = n.signum() * dx.hypot(dy);
        let theta = (n.signum() * dx).atan2(n.signum() * dy);

        let lon = theta / n + self.lon_0.to_radians();

        let t = (rho / a_f).powf(1.0 / n);
        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        for _ in 0..15 {
            let es = e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(e / 2.0)).atan();
            let done = (next - phi).abs() < 1e-12;
            phi = next;
            if done {
                break;
            }
        }

        GeoPoint::new(lon.to_degrees(), phi.to_degrees())
    }
}

pub(crate) fn m(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

pub(crate) fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

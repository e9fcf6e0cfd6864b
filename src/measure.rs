//! Coordinate types and the two distance models used by the index.
//!
//! [`Metric::Euclidean`] treats points as plane coordinates. [`Metric::Geodesic`] reads `x` as
//! longitude and `y` as latitude in degrees and measures great-circle (haversine) distance on a
//! sphere of radius [`EARTH_RADIUS`]; distances are then in meters.

use crate::r#type::KnnNum;

/// Mean Earth radius in meters used by the geodesic metric.
pub const EARTH_RADIUS: f64 = 6_371_009.0;

/// A 2-D point.
///
/// The coordinate pair has no unit of its own: under [`Metric::Euclidean`] it is a plane
/// position, under [`Metric::Geodesic`] it is `(longitude, latitude)` in degrees with
/// `-180 <= x <= 180` and `-90 <= y <= 90`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2<N: KnnNum> {
    /// Plane x, or longitude in degrees.
    pub x: N,
    /// Plane y, or latitude in degrees.
    pub y: N,
}

impl<N: KnnNum> Point2<N> {
    /// Create a new point.
    pub fn new(x: N, y: N) -> Self {
        Self { x, y }
    }
}

/// The distance model applied to a query or measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Straight-line distance in the coordinate plane.
    #[default]
    Euclidean,
    /// Great-circle distance on a sphere of radius [`EARTH_RADIUS`], in meters.
    Geodesic,
}

impl Metric {
    /// Distance between two points under this metric.
    pub fn distance<N: KnnNum>(&self, a: Point2<N>, b: Point2<N>) -> f64 {
        match self {
            Metric::Euclidean => euclidean(a.x.as_f64(), a.y.as_f64(), b.x.as_f64(), b.y.as_f64()),
            Metric::Geodesic => haversine(a.x.as_f64(), a.y.as_f64(), b.x.as_f64(), b.y.as_f64()),
        }
    }
}

/// Distance between two points under `metric`.
///
/// Symmetric, zero for coincident points, and total over valid coordinate ranges. The geodesic
/// form does not normalize longitude differences itself; the half-angle terms make it agree with
/// the shortest arc across the antimeridian anyway.
pub fn measure<N: KnnNum>(a: Point2<N>, b: Point2<N>, metric: Metric) -> f64 {
    metric.distance(a, b)
}

#[inline]
pub(crate) fn euclidean(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Haversine great-circle distance, in meters, from `(lng, lat)` pairs in degrees.
///
/// The half-angle formulation stays numerically stable for small separations where the spherical
/// law of cosines loses precision.
#[inline]
pub(crate) fn haversine(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    let lng1 = lng1.to_radians();
    let lat1 = lat1.to_radians();
    let lng2 = lng2.to_radians();
    let lat2 = lat2.to_radians();
    let half_lng = (lng1 - lng2) / 2.0;
    let half_lat = (lat1 - lat2) / 2.0;
    let h = half_lat.sin().powi(2) + lat1.cos() * lat2.cos() * half_lng.sin().powi(2);
    EARTH_RADIUS * 2.0 * h.sqrt().asin()
}

//! Geodesic branch-and-bound traversal.
//!
//! On a sphere the distance from a query to an excluded subtree is not a scalar coordinate gap:
//! the nearest point of the excluded wedge may sit at a corner, on a bounding meridian, or on a
//! bounding parallel, and longitude wraps at the antimeridian. The traversal therefore threads a
//! longitude/latitude [`Region`] through the recursion (the rectangle implied by the split
//! constraints on the path from the root) and prunes the far child with an exact lower bound on
//! the distance to the opposite region.

use crate::kdtree::index::{ChildSide, SearchNode};
use crate::kdtree::search::SearchState;
use crate::measure::{haversine, EARTH_RADIUS};
use crate::r#type::KnnNum;

/// A closed longitude/latitude rectangle accumulated along a tree path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Region {
    north: f64,
    south: f64,
    west: f64,
    east: f64,
}

impl Region {
    /// The whole sphere; the region in effect at the root.
    pub(crate) const WORLD: Region = Region {
        north: 90.0,
        south: -90.0,
        west: -180.0,
        east: 180.0,
    };
}

pub(crate) fn search_geodesic<N: KnnNum>(
    node: &SearchNode<N>,
    region: Region,
    state: &mut SearchState<N>,
) {
    state.traverse += 1;
    let d = haversine(state.qx, state.qy, node.x.as_f64(), node.y.as_f64());
    state.insert(d, node);

    let which = next_child(state.qx, state.qy, region, node);
    if let Some(child) = node.child(which) {
        search_geodesic(child, next_region(node, region, which), state);
    }

    let opposite = which.opposite();
    let far_region = next_region(node, region, opposite);
    let bound = min_dist_to_region(state.qx, state.qy, far_region, node.splits_x());
    if bound <= state.prune_bound() {
        if let Some(child) = node.child(opposite) {
            search_geodesic(child, far_region, state);
        }
    }
}

/// Absolute angular difference of two longitudes, in `[0, 180]` degrees.
fn lng_gap(lng1: f64, lng2: f64) -> f64 {
    let mut lng = lng1 - lng2;
    while lng > 180.0 {
        lng -= 360.0;
    }
    while lng < -180.0 {
        lng += 360.0;
    }
    lng.abs()
}

/// Pick the child on the query's side of the split.
///
/// For a longitude split with the query outside the current wedge (wraparound), the side whose
/// boundary meridian is angularly closer wins. Latitude splits compare directly; the pole cases
/// are handled by the distance-to-boundary math, not here.
fn next_child<N: KnnNum>(qx: f64, qy: f64, region: Region, node: &SearchNode<N>) -> ChildSide {
    if node.splits_x() {
        if region.west <= qx && qx <= region.east {
            if qx < node.x.as_f64() {
                ChildSide::Left
            } else {
                ChildSide::Right
            }
        } else if lng_gap(qx, region.west) < lng_gap(qx, region.east) {
            ChildSide::Left
        } else {
            ChildSide::Right
        }
    } else if qy < node.y.as_f64() {
        ChildSide::Left
    } else {
        ChildSide::Right
    }
}

/// Tighten `region` with the constraint of descending to `which` at `node`.
fn next_region<N: KnnNum>(node: &SearchNode<N>, mut region: Region, which: ChildSide) -> Region {
    if node.splits_x() {
        match which {
            ChildSide::Left => region.east = node.x.as_f64(),
            ChildSide::Right => region.west = node.x.as_f64(),
        }
    } else {
        match which {
            ChildSide::Left => region.north = node.y.as_f64(),
            ChildSide::Right => region.south = node.y.as_f64(),
        }
    }
    region
}

/// Lower bound on the distance from `(qx, qy)` to any point of `region`.
///
/// The query must lie outside the region: the nearest region point then sits on one of the four
/// boundary segments, so the minimum over their distances is the exact region distance. For a
/// longitude split the two bounding parallels cannot hold the minimum anywhere but at their
/// endpoints (which the meridian segments share), so only the meridians are evaluated. A
/// latitude split also evaluates the meridian segments: with the query outside the longitude
/// wedge, the nearest boundary point can fall in the interior of a meridian, closer than every
/// corner.
///
/// # Panics
///
/// Panics when the query lies strictly inside the region (or inside the split axis' band). That
/// is a region bookkeeping bug, never a caller error, and silently returning a bound here could
/// prune points that still qualify.
pub(crate) fn min_dist_to_region(qx: f64, qy: f64, region: Region, lng_split: bool) -> f64 {
    assert!(
        !(region.west < qx && qx < region.east && region.south < qy && qy < region.north),
        "query ({qx}, {qy}) is inside the region being bounded"
    );
    if lng_split {
        assert!(
            !(region.west < qx && qx < region.east),
            "query longitude {qx} is inside the region's longitude range"
        );
        dist_to_meridian(qx, qy, region.east, region.south, region.north)
            .min(dist_to_meridian(qx, qy, region.west, region.south, region.north))
    } else {
        assert!(
            !(region.south < qy && qy < region.north),
            "query latitude {qy} is inside the region's latitude range"
        );
        dist_to_parallel(qx, qy, region.north, region.west, region.east)
            .min(dist_to_parallel(qx, qy, region.south, region.west, region.east))
            .min(dist_to_meridian(qx, qy, region.east, region.south, region.north))
            .min(dist_to_meridian(qx, qy, region.west, region.south, region.north))
    }
}

/// Distance to a meridian segment at `longitude` spanning latitudes `(south, north)`.
///
/// The minimum is at one of the endpoints, or at the perpendicular foot on the meridian when the
/// query is within 90 degrees of it in longitude and the foot latitude falls inside the span.
/// Beyond 90 degrees the perpendicular foot lands on the antipodal half of the great circle, and
/// the segment minimum is always an endpoint.
fn dist_to_meridian(qx: f64, qy: f64, longitude: f64, south: f64, north: f64) -> f64 {
    let mut dist = haversine(qx, qy, longitude, south).min(haversine(qx, qy, longitude, north));
    let gap = lng_gap(qx, longitude);
    if gap <= 90.0 {
        let lng = gap.to_radians();
        let lat = qy.to_radians();
        let perpendicular = EARTH_RADIUS * (lng.sin() * lat.cos()).asin();
        let foot_lat = 90.0 - lng.cos().atan2(lat.tan()).to_degrees();
        if south < foot_lat && foot_lat < north {
            dist = dist.min(perpendicular);
        }
    }
    dist
}

/// Distance to a parallel segment at `latitude` spanning longitudes `(west, east)`.
///
/// The minimum is at one of the endpoints, or straight down the query's own meridian when its
/// longitude lies strictly inside the span.
fn dist_to_parallel(qx: f64, qy: f64, latitude: f64, west: f64, east: f64) -> f64 {
    let mut dist = haversine(qx, qy, east, latitude).min(haversine(qx, qy, west, latitude));
    if west < qx && qx < east {
        dist = dist.min(EARTH_RADIUS * (qy - latitude).abs().to_radians());
    }
    dist
}

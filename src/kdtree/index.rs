use geo_traits::CoordTrait;
use log::debug;

use crate::error::{GeoKnnError, Result};
use crate::kdtree::builder::{build_subtree, KdTreeBuilder};
use crate::kdtree::search::{search_euclidean, MeasuredPoint, SearchState};
use crate::kdtree::sphere::{search_geodesic, Region};
use crate::measure::{Metric, Point2};
use crate::r#type::KnnNum;

/// One vertex of the kd-tree.
///
/// Each node carries one indexed point. At even depth the subtree is split on `x` (longitude),
/// at odd depth on `y` (latitude): every point in the left subtree is `<=` the node on the split
/// coordinate, every point in the right subtree is `>=` it. Ties from duplicate coordinates may
/// land on either side.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchNode<N: KnnNum> {
    pub(crate) x: N,
    pub(crate) y: N,
    pub(crate) depth: usize,
    pub(crate) left: Option<Box<SearchNode<N>>>,
    pub(crate) right: Option<Box<SearchNode<N>>>,
}

/// Which side of a split a traversal step descends into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildSide {
    Left,
    Right,
}

impl ChildSide {
    pub(crate) fn opposite(self) -> ChildSide {
        match self {
            ChildSide::Left => ChildSide::Right,
            ChildSide::Right => ChildSide::Left,
        }
    }
}

impl<N: KnnNum> SearchNode<N> {
    /// The node's own x (longitude) coordinate.
    pub fn x(&self) -> N {
        self.x
    }

    /// The node's own y (latitude) coordinate.
    pub fn y(&self) -> N {
        self.y
    }

    /// The node's point.
    pub fn point(&self) -> Point2<N> {
        Point2::new(self.x, self.y)
    }

    /// Distance from the root; determines the split axis by parity.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The subtree of points at or below this node's split coordinate.
    pub fn left(&self) -> Option<&SearchNode<N>> {
        self.left.as_deref()
    }

    /// The subtree of points at or above this node's split coordinate.
    pub fn right(&self) -> Option<&SearchNode<N>> {
        self.right.as_deref()
    }

    /// `true` when this node splits on the x (longitude) axis.
    #[inline]
    pub(crate) fn splits_x(&self) -> bool {
        self.depth % 2 == 0
    }

    #[inline]
    pub(crate) fn child(&self, side: ChildSide) -> Option<&SearchNode<N>> {
        match side {
            ChildSide::Left => self.left.as_deref(),
            ChildSide::Right => self.right.as_deref(),
        }
    }

    fn release(&mut self) {
        if let Some(mut child) = self.left.take() {
            child.release();
        }
        if let Some(mut child) = self.right.take() {
            child.release();
        }
    }
}

/// An immutable kd-tree over a fixed point set.
///
/// Built once via [`KdTree::build`] or [`KdTreeBuilder`]; afterwards the tree is read-only and
/// any number of queries may run against it concurrently from separate threads.
#[derive(Debug, Clone, PartialEq)]
pub struct KdTree<N: KnnNum> {
    pub(crate) root: SearchNode<N>,
    pub(crate) num_items: usize,
}

impl<N: KnnNum> KdTree<N> {
    /// Build a tree from a non-empty point collection.
    ///
    /// Points are partitioned by recursive median split: each level sorts its subset on the
    /// depth-parity axis and promotes the middle point to the node. Duplicate coordinates are
    /// kept as distinct nodes.
    ///
    /// Returns [`GeoKnnError::EmptyPointSet`] when `points` yields nothing.
    pub fn build(points: impl IntoIterator<Item = Point2<N>>) -> Result<Self> {
        let mut points: Vec<_> = points.into_iter().collect();
        if points.is_empty() {
            return Err(GeoKnnError::EmptyPointSet);
        }
        let num_items = points.len();
        let root = build_subtree(&mut points, 0);
        Ok(Self { root, num_items })
    }

    /// Create a [`KdTreeBuilder`] with capacity for `num_items` points.
    pub fn builder(num_items: usize) -> KdTreeBuilder<N> {
        KdTreeBuilder::with_capacity(num_items)
    }

    /// The number of indexed points.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Access the root node for manual traversal.
    pub fn root(&self) -> &SearchNode<N> {
        &self.root
    }

    /// Search the `k` nearest points to `query`, plus every point within distance `r`.
    ///
    /// The result is sorted ascending by distance and holds at least `min(k, num_items)`
    /// entries; with `r > 0` every point whose distance is `<= r` is included even past the
    /// `k`-th. `r` is in the units of `metric` (plane units, or meters for
    /// [`Metric::Geodesic`]). Equidistant points order by traversal, which callers must not
    /// rely on.
    ///
    /// Returns [`GeoKnnError::ZeroNeighborCount`] for `k == 0` and
    /// [`GeoKnnError::InvalidRadius`] for a negative or NaN `r`.
    pub fn search_nearest(
        &self,
        query: Point2<N>,
        k: usize,
        r: f64,
        metric: Metric,
    ) -> Result<Vec<MeasuredPoint<N>>> {
        if k == 0 {
            return Err(GeoKnnError::ZeroNeighborCount);
        }
        if !(r >= 0.0) {
            return Err(GeoKnnError::InvalidRadius(r));
        }

        let mut state = SearchState::new(query, k, r);
        match metric {
            Metric::Euclidean => search_euclidean(&self.root, &mut state),
            Metric::Geodesic => search_geodesic(&self.root, Region::WORLD, &mut state),
        }
        debug!("traverse: {} (k={}, r={})", state.traverse, k, r);
        Ok(state.into_results())
    }

    /// [`search_nearest`][Self::search_nearest] for any [`CoordTrait`] query.
    pub fn search_nearest_coord(
        &self,
        query: &impl CoordTrait<T = N>,
        k: usize,
        r: f64,
        metric: Metric,
    ) -> Result<Vec<MeasuredPoint<N>>> {
        self.search_nearest(Point2::new(query.x(), query.y()), k, r, metric)
    }

    /// Run independent queries in parallel with rayon.
    #[cfg(feature = "rayon")]
    pub fn search_nearest_batch(
        &self,
        queries: &[Point2<N>],
        k: usize,
        r: f64,
        metric: Metric,
    ) -> Result<Vec<Vec<MeasuredPoint<N>>>> {
        use rayon::prelude::*;
        queries
            .par_iter()
            .map(|query| self.search_nearest(*query, k, r, metric))
            .collect()
    }

    /// Detach every descendant link, leaving only the bare root node.
    ///
    /// Dropping the tree releases it just as well; this explicit teardown exists for callers
    /// that want to tear a large tree down at a chosen time. The `&mut` receiver guarantees no
    /// query is in flight. The tree must not be searched afterwards.
    pub fn release(&mut self) {
        self.root.release();
    }
}

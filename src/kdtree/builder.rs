use std::cmp::Ordering;

use geo_traits::CoordTrait;

use crate::error::Result;
use crate::kdtree::index::SearchNode;
use crate::kdtree::KdTree;
use crate::measure::Point2;
use crate::r#type::KnnNum;

/// A builder to create a [`KdTree`].
///
/// ```
/// use geo_knn::KdTreeBuilder;
///
/// let mut builder = KdTreeBuilder::new();
/// builder.add(0.0, 0.0);
/// builder.add(1.0, 1.0);
/// let tree = builder.finish().unwrap();
/// assert_eq!(tree.num_items(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KdTreeBuilder<N: KnnNum> {
    points: Vec<Point2<N>>,
}

impl<N: KnnNum> KdTreeBuilder<N> {
    /// Create a new, empty builder.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a builder with capacity for `num_items` points.
    pub fn with_capacity(num_items: usize) -> Self {
        Self {
            points: Vec::with_capacity(num_items),
        }
    }

    /// Add a point to the index. Returns its insertion index.
    pub fn add(&mut self, x: N, y: N) -> usize {
        self.points.push(Point2::new(x, y));
        self.points.len() - 1
    }

    /// Add any [`CoordTrait`] point to the index. Returns its insertion index.
    pub fn add_coord(&mut self, coord: &impl CoordTrait<T = N>) -> usize {
        self.add(coord.x(), coord.y())
    }

    /// Consume this builder, performing the recursive median split and producing a [`KdTree`]
    /// ready for queries.
    ///
    /// Fails with [`GeoKnnError::EmptyPointSet`][crate::GeoKnnError::EmptyPointSet] when no
    /// points were added.
    pub fn finish(self) -> Result<KdTree<N>> {
        KdTree::build(self.points)
    }
}

/// Median-split construction over a point subset.
///
/// Sorts the subset on the depth-parity axis, promotes the middle point, and recurses on the
/// strict sub-ranges. Each level re-sorts its own slice, `O(n log^2 n)` overall, which is plain
/// and fast enough for the workloads this index targets.
pub(crate) fn build_subtree<N: KnnNum>(points: &mut [Point2<N>], depth: usize) -> SearchNode<N> {
    debug_assert!(!points.is_empty());
    if depth % 2 == 0 {
        points.sort_unstable_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    } else {
        points.sort_unstable_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal));
    }

    let mid = points.len() / 2;
    let point = points[mid];
    let (below, rest) = points.split_at_mut(mid);
    let above = &mut rest[1..];

    SearchNode {
        x: point.x,
        y: point.y,
        depth,
        left: (!below.is_empty()).then(|| Box::new(build_subtree(below, depth + 1))),
        right: (!above.is_empty()).then(|| Box::new(build_subtree(above, depth + 1))),
    }
}

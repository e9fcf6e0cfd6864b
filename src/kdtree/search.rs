use tinyvec::TinyVec;

use crate::kdtree::index::SearchNode;
use crate::measure::{euclidean, Point2};
use crate::r#type::KnnNum;

/// A point found by a search, paired with its distance from the query.
///
/// Transient: created fresh per query, never stored in the tree. `dist` is in the units of the
/// query's metric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeasuredPoint<N: KnnNum> {
    /// Plane x, or longitude in degrees.
    pub x: N,
    /// Plane y, or latitude in degrees.
    pub y: N,
    /// Distance from the query point.
    pub dist: f64,
}

impl<N: KnnNum> MeasuredPoint<N> {
    /// The found point without its distance.
    pub fn point(&self) -> Point2<N> {
        Point2::new(self.x, self.y)
    }
}

/// Per-query traversal state: the immutable query parameters plus the mutable result buffer and
/// traversal counter, passed by reference through the recursion.
///
/// The buffer is kept ascending by distance. It is a `TinyVec` so that small-`k` queries never
/// touch the heap.
pub(crate) struct SearchState<N: KnnNum> {
    pub(crate) qx: f64,
    pub(crate) qy: f64,
    k: usize,
    r: f64,
    result: TinyVec<[MeasuredPoint<N>; 16]>,
    pub(crate) traverse: usize,
}

impl<N: KnnNum> SearchState<N> {
    pub(crate) fn new(query: Point2<N>, k: usize, r: f64) -> Self {
        Self {
            qx: query.x.as_f64(),
            qy: query.y.as_f64(),
            k,
            r,
            result: TinyVec::new(),
            traverse: 0,
        }
    }

    /// Offer a candidate to the result buffer.
    ///
    /// The candidate enters at its sorted position when the buffer is still short of `k`, or its
    /// distance is within `r`, or it beats the current worst entry. After an insertion the worst
    /// entry is dropped again if the buffer already held `k` entries and the worst now exceeds
    /// `r`, so the buffer converges on the `k` nearest plus everything within the radius.
    pub(crate) fn insert(&mut self, d: f64, node: &SearchNode<N>) {
        let size = self.result.len();
        let mut index = None;
        if size > 0 && d < self.result[size - 1].dist {
            let mut i = size - 1;
            while i > 0 && d < self.result[i - 1].dist {
                i -= 1;
            }
            index = Some(i);
        } else if size < self.k || d <= self.r {
            index = Some(size);
        }
        if let Some(i) = index {
            self.result.insert(
                i,
                MeasuredPoint {
                    x: node.x,
                    y: node.y,
                    dist: d,
                },
            );
            if size >= self.k && self.result[size].dist > self.r {
                self.result.pop();
            }
        }
    }

    /// The largest distance a far subtree could still contribute at: the current worst retained
    /// distance, or the search radius if that is larger. Infinite while the buffer is empty, so
    /// nothing is pruned before the first candidates arrive.
    #[inline]
    pub(crate) fn prune_bound(&self) -> f64 {
        self.result
            .last()
            .map_or(f64::INFINITY, |worst| worst.dist)
            .max(self.r)
    }

    pub(crate) fn into_results(self) -> Vec<MeasuredPoint<N>> {
        self.result.into_iter().collect()
    }
}

/// Planar branch-and-bound traversal.
///
/// Descends the near child unconditionally, then the far child only when the perpendicular gap
/// to the split line is within the prune bound.
pub(crate) fn search_euclidean<N: KnnNum>(node: &SearchNode<N>, state: &mut SearchState<N>) {
    state.traverse += 1;
    let d = euclidean(state.qx, state.qy, node.x.as_f64(), node.y.as_f64());
    state.insert(d, node);

    let (value, threshold) = if node.splits_x() {
        (state.qx, node.x.as_f64())
    } else {
        (state.qy, node.y.as_f64())
    };
    let (near, far) = if value < threshold {
        (&node.left, &node.right)
    } else {
        (&node.right, &node.left)
    };

    if let Some(child) = near {
        search_euclidean(child, state);
    }

    let gap = (value - threshold).abs();
    if gap <= state.prune_bound() {
        if let Some(child) = far {
            search_euclidean(child, state);
        }
    }
}

use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum GeoKnnError {
    /// A tree cannot be built from zero points.
    #[error("Cannot build an index from an empty point set.")]
    EmptyPointSet,

    /// `search_nearest` was called with `k == 0`.
    #[error("Neighbor count k must be at least 1.")]
    ZeroNeighborCount,

    /// `search_nearest` was called with a negative (or NaN) radius.
    #[error("Search radius must be non-negative, got {0}.")]
    InvalidRadius(f64),
}

pub type Result<T> = std::result::Result<T, GeoKnnError>;

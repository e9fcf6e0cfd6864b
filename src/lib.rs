#![doc = include_str!("../README.md")]

mod error;
pub mod kdtree;
pub mod measure;
mod r#type;

pub use error::GeoKnnError;
pub use kdtree::{KdTree, KdTreeBuilder, MeasuredPoint, SearchNode};
pub use measure::{measure, Metric, Point2, EARTH_RADIUS};
pub use r#type::KnnNum;

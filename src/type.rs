use std::fmt::Debug;

use num_traits::Float;

/// A trait for floating coordinate types accepted by the index.
///
/// This trait is sealed and cannot be implemented for external types. Coordinates are stored at
/// the precision of `N`, while all distance math is carried out in `f64`; `as_f64` is the exact
/// widening used at that boundary.
pub trait KnnNum: private::Sealed + Float + Debug + Default + Send + Sync + 'static {
    /// Widen to `f64` without loss.
    fn as_f64(self) -> f64;
}

impl KnnNum for f32 {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl KnnNum for f64 {
    fn as_f64(self) -> f64 {
        self
    }
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

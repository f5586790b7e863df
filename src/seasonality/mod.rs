//! Seasonal decomposition.

mod stl;

pub use stl::{Decomposition, StlDecomposer};

//! Variance-stabilizing transforms.

mod boxcox;

pub use boxcox::BoxCoxTransform;

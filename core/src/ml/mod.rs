//! Pretrained classifier: a dense feed-forward network evaluated in f64.

pub mod math;
pub mod model;

pub use model::{Activation, DenseLayer, DenseNetwork};

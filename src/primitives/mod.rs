//! Core compute primitives (Vector, Matrix).
//!
//! These types back the encoder, scorer and clustering algorithms.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;

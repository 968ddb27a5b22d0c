#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

//! Exact truncation regions for selective inference after a sparse
//! regression whose regularisation level was chosen by cross-validation.
//!
//! Everything happens on the data line `y(z) = a + b z` through the observed
//! response along a test direction. The path solver's output is reduced to
//! piecewise quadratics in `z`, and the region where the observed selection
//! repeats is assembled from exact quadratic inequalities.

pub mod analysis;
pub mod config;
pub mod construction;
pub mod interval;
pub mod numeric;
pub mod path;
pub mod projection;
pub mod quadratic;
pub mod selection;

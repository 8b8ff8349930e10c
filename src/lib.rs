//! Post-processor for solved 2D planar and axisymmetric magnetics
//! finite-element problems
//!
//! Given a solved mesh (nodal complex vector potential, triangular
//! elements with material assignments, circuits and optional air-gap
//! elements), this crate computes pointwise field quantities, contour and
//! block integrals, air-gap harmonic decompositions with the torque,
//! force and energy derived from them, and circuit-level flux linkage and
//! voltage drop.
//!
//! The entry point is [`PostProcessor`]: `open` a solution file, select
//! regions or build a contour, then query.

pub mod config;
pub mod error;
pub mod expr;
pub mod field;
pub mod gap;
pub mod integral;
pub mod linkage;
pub mod loader;
pub mod mesh;
pub mod model;
pub mod post;
pub mod units;

pub use config::PostConfig;
pub use error::{GapError, LoadError, WarningSink};
pub use field::PointValues;
pub use gap::GapHarmonic;
pub use integral::{BlockIntegrand, LineIntegrand};
pub use post::PostProcessor;
pub use units::{Coords, LengthUnit, PrevType, ProblemType, MU0};

pub use num_complex::Complex64;

//! In-memory model of a solved magnetics problem
//!
//! Everything the loader produces lives here: mesh nodes and elements,
//! geometry entities, property tables, circuits, and air-gap elements.
//! Elements reference nodes by index and labels by index; there are no
//! cyclic references.

pub mod airgap;
pub mod circuit;
pub mod label;
pub mod material;
pub mod mesh;
pub mod properties;

pub use airgap::{AirGapElement, GapFormat, QuadPoint};
pub use circuit::{Circuit, CircuitKind};
pub use label::{BlockLabel, BlockSource};
pub use material::{LamType, Material};
pub use mesh::{MeshElement, MeshNode};
pub use properties::{ArcSegment, BoundaryProp, Node, PointProp, Segment};

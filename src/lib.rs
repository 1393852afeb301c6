//! Boundary-graded triangular meshes for planar polygons with holes.
//!
//! The pipeline turns a [`Geometry`](data::Geometry) into a [`Mesh`](export::Mesh):
//!
//! 1. [`Pslg::load`](data::Pslg::load) normalizes the rings into a planar
//!    straight-line graph.
//! 2. [`ConstrainedTriangulation::new`](algorithms::triangulation::ConstrainedTriangulation::new)
//!    builds a constrained Delaunay triangulation and carves away holes and the
//!    exterior.
//! 3. [`Refiner`](algorithms::refinement::Refiner) inserts Steiner points until
//!    every triangle satisfies the angle bound and the [`SizingField`](algorithms::sizing::SizingField).
//! 4. [`Mesh::export`](export::Mesh::export) hands the result to whoever renders
//!    or serializes it.
//!
//! [`generate_mesh`] runs all four stages.
//!
//! ```rust
//! # use rgeometry_mesh::*;
//! # use rgeometry_mesh::data::*;
//! # use rgeometry_mesh::algorithms::sizing::SizingParams;
//! # use rgeometry_mesh::algorithms::refinement::{QualityBounds, RefinementBudget};
//! let square = Geometry::Polygon(PolygonGeometry {
//!   outer: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
//!   holes: vec![],
//! });
//! let options = MeshOptions {
//!   sizing: SizingParams::new(1.0, 4.0, 0.5, 10.0),
//!   quality: QualityBounds::new(20.0),
//!   budget: RefinementBudget::new(10_000),
//! };
//! let mesh = generate_mesh(&square, &options)?;
//! assert!(mesh.triangles.len() > 2);
//! # Ok::<(), Error>(())
//! ```
#![deny(clippy::cast_lossless)]
#![doc(test(no_crate_inject))]

pub mod algorithms;
pub mod data;
pub mod export;
mod mesher;
mod orientation;

#[cfg(test)]
pub mod testing;

pub use mesher::{generate_mesh, MeshOptions, MeshSession};
pub use orientation::{in_circle, Orientation};

use data::PointId;

/// Relative tolerance used for metric degeneracy checks (circumcenters,
/// near-duplicate Steiner points). Scaled by the squared or plain length of
/// the local edges before use.
pub const EPSILON: f64 = 1e-10;

/// Failure kinds of the meshing pipeline.
///
/// Errors are raised where they are detected and are never recovered from
/// inside the crate.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
  /// A ring is malformed: too few distinct points, zero area, non-finite
  /// coordinates or a hole outside the outer ring's bounding box.
  #[error("invalid geometry: {reason}")]
  InvalidGeometry { reason: String },
  /// Sizing or quality parameters are out of order or out of range.
  #[error("invalid configuration: {reason}")]
  InvalidConfiguration { reason: String },
  /// A boundary edge could not be recovered in the triangulation.
  #[error("boundary edge {from:?}-{to:?} could not be recovered")]
  DegenerateConstraint { from: PointId, to: PointId },
  /// The refinement budget ran out, or bad triangles could not be split.
  #[error(
    "refinement stalled with {remaining_bad} bad triangles after {steiner_points} steiner points"
  )]
  RefinementStalled {
    remaining_bad: usize,
    steiner_points: usize,
  },
}

impl Error {
  pub(crate) fn geometry(reason: impl Into<String>) -> Error {
    Error::InvalidGeometry {
      reason: reason.into(),
    }
  }

  pub(crate) fn configuration(reason: impl Into<String>) -> Error {
    Error::InvalidConfiguration {
      reason: reason.into(),
    }
  }
}

pub mod constrained_delaunay;
pub mod delaunay;

pub use constrained_delaunay::ConstrainedTriangulation;
pub use delaunay::{
  Edge, Location, SubIdx, TriIdx, Triangle, TriangularNetwork, VertIdx, Walk, SUPER_VERTICES,
};

mod aabb;
mod geometry;
mod line_segment;
pub(crate) mod point;
mod pslg;
mod triangle;
mod vector;

pub use aabb::Aabb;
pub use geometry::{Geometry, PolygonGeometry};
pub use line_segment::{LineSegment, LineSegmentView};
pub use point::Point;
pub use pslg::{Constraint, DirectedIndexEdge, IndexEdge, PointId, Pslg, Ring, RingId, RingKind};
pub use triangle::TriangleView;
pub use vector::Vector;

pub mod refinement;
pub mod sizing;
pub mod triangulation;

#[doc(inline)]
pub use refinement::{QualityBounds, RefinementBudget, Refiner};
#[doc(inline)]
pub use sizing::{SizingField, SizingParams};
#[doc(inline)]
pub use triangulation::ConstrainedTriangulation;

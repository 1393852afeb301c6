//! Distance-graded target element size.
//!
//! The field measures the distance `d` from a point to the nearest boundary
//! segment and maps it through a clamped linear ramp:
//!
//! ```text
//! size
//!  ^
//!  |              ____________ size_max
//!  |             /
//!  |            /
//!  |  _________/               size_min
//!  +-----------|-----|-------> d
//!          dist_min  dist_max
//! ```
use serde::{Deserialize, Serialize};

use crate::data::{LineSegment, Point, Pslg};
use crate::Error;

mod segment_tree;
pub use segment_tree::SegmentTree;

/// The four scalars controlling the sizing ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingParams {
  pub size_min: f64,
  pub size_max: f64,
  pub dist_min: f64,
  pub dist_max: f64,
}

impl SizingParams {
  pub fn new(size_min: f64, size_max: f64, dist_min: f64, dist_max: f64) -> SizingParams {
    SizingParams {
      size_min,
      size_max,
      dist_min,
      dist_max,
    }
  }

  /// # Errors
  ///
  /// [`Error::InvalidConfiguration`] if a value is not finite, `size_min` is
  /// not positive, `dist_min` is negative, or either pair is out of order.
  pub fn validate(&self) -> Result<(), Error> {
    let all = [self.size_min, self.size_max, self.dist_min, self.dist_max];
    if all.iter().any(|v| !v.is_finite()) {
      return Err(Error::configuration("sizing parameters must be finite"));
    }
    if self.size_min > self.size_max {
      return Err(Error::configuration(format!(
        "size_min ({}) is greater than size_max ({})",
        self.size_min, self.size_max
      )));
    }
    if self.dist_min > self.dist_max {
      return Err(Error::configuration(format!(
        "dist_min ({}) is greater than dist_max ({})",
        self.dist_min, self.dist_max
      )));
    }
    if self.size_min <= 0.0 {
      return Err(Error::configuration("size_min must be positive"));
    }
    if self.dist_min < 0.0 {
      return Err(Error::configuration("dist_min must not be negative"));
    }
    Ok(())
  }

  /// The ramp itself.
  pub fn size_for_distance(&self, d: f64) -> f64 {
    if d <= self.dist_min {
      self.size_min
    } else if d >= self.dist_max {
      self.size_max
    } else {
      let t = (d - self.dist_min) / (self.dist_max - self.dist_min);
      self.size_min + t * (self.size_max - self.size_min)
    }
  }
}

/// Target element size at any point of the plane. Immutable once built.
#[derive(Debug, Clone)]
pub struct SizingField {
  params: SizingParams,
  tree: Option<SegmentTree>,
}

impl SizingField {
  /// Index the boundary edges of `pslg`.
  pub fn new(pslg: &Pslg, params: SizingParams) -> SizingField {
    let segments = pslg
      .constraints()
      .iter()
      .map(|c| LineSegment::new(*pslg.point(c.edge.src), *pslg.point(c.edge.dst)))
      .collect();
    SizingField {
      params,
      tree: SegmentTree::build(segments),
    }
  }

  pub fn params(&self) -> &SizingParams {
    &self.params
  }

  /// Distance to the nearest boundary segment. Infinite when there are no
  /// segments.
  pub fn distance_to_boundary(&self, pt: &Point<f64, 2>) -> f64 {
    match &self.tree {
      Some(tree) => tree.nearest_squared_distance(pt).sqrt(),
      None => f64::INFINITY,
    }
  }

  pub fn size_at(&self, pt: &Point<f64, 2>) -> f64 {
    self
      .params
      .size_for_distance(self.distance_to_boundary(pt))
  }
}

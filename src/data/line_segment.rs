use super::{Aabb, Point};
use crate::Orientation;

/// Borrowed segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegmentView<'a> {
  pub src: &'a Point<f64, 2>,
  pub dst: &'a Point<f64, 2>,
}

/// Owned segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
  pub src: Point<f64, 2>,
  pub dst: Point<f64, 2>,
}

impl LineSegment {
  pub fn new(src: Point<f64, 2>, dst: Point<f64, 2>) -> LineSegment {
    LineSegment { src, dst }
  }

  pub fn as_ref(&self) -> LineSegmentView<'_> {
    LineSegmentView {
      src: &self.src,
      dst: &self.dst,
    }
  }
}

impl<'a> LineSegmentView<'a> {
  pub fn new(src: &'a Point<f64, 2>, dst: &'a Point<f64, 2>) -> LineSegmentView<'a> {
    LineSegmentView { src, dst }
  }

  pub fn length(&self) -> f64 {
    self.src.euclidean_distance(self.dst)
  }

  pub fn squared_length(&self) -> f64 {
    self.src.squared_euclidean_distance(self.dst)
  }

  pub fn midpoint(&self) -> Point<f64, 2> {
    self.src.midpoint(self.dst)
  }

  pub fn aabb(&self) -> Aabb {
    Aabb::from_points(self.src, self.dst)
  }

  /// Closest point on the segment to `pt`.
  pub fn closest_point(&self, pt: &Point<f64, 2>) -> Point<f64, 2> {
    let dir = self.dst - self.src;
    let len2 = dir.squared_magnitude();
    if len2 == 0.0 {
      return *self.src;
    }
    let t = ((pt - self.src).dot(&dir) / len2).clamp(0.0, 1.0);
    self.src.lerp(self.dst, t)
  }

  pub fn squared_distance_to(&self, pt: &Point<f64, 2>) -> f64 {
    self.closest_point(pt).squared_euclidean_distance(pt)
  }

  pub fn distance_to(&self, pt: &Point<f64, 2>) -> f64 {
    self.squared_distance_to(pt).sqrt()
  }

  /// True if `pt` lies strictly inside the circle that has this segment as
  /// its diameter. Equivalent to the segment subtending an obtuse angle at
  /// `pt`.
  pub fn diametral_encroached_by(&self, pt: &Point<f64, 2>) -> bool {
    (self.src - pt).dot(&(self.dst - pt)) < 0.0
  }

  /// True if the two segments share a point in their relative interiors,
  /// i.e. they cross properly. Touching at endpoints does not count.
  pub fn crosses(&self, other: &LineSegmentView<'_>) -> bool {
    let o1 = Orientation::new(self.src, self.dst, other.src);
    let o2 = Orientation::new(self.src, self.dst, other.dst);
    let o3 = Orientation::new(other.src, other.dst, self.src);
    let o4 = Orientation::new(other.src, other.dst, self.dst);
    !o1.is_colinear()
      && !o2.is_colinear()
      && !o3.is_colinear()
      && !o4.is_colinear()
      && o1 != o2
      && o3 != o4
  }

  /// True if `pt` is colinear with the segment and strictly between its
  /// endpoints.
  pub fn contains_interior(&self, pt: &Point<f64, 2>) -> bool {
    if !Orientation::new(self.src, self.dst, pt).is_colinear() {
      return false;
    }
    (pt - self.src).dot(&(self.dst - self.src)) > 0.0
      && (pt - self.dst).dot(&(self.src - self.dst)) > 0.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn distances() {
    let a = Point::new([0.0, 0.0]);
    let b = Point::new([4.0, 0.0]);
    let seg = LineSegmentView::new(&a, &b);
    assert_eq!(seg.length(), 4.0);
    assert_eq!(seg.distance_to(&Point::new([2.0, 3.0])), 3.0);
    assert_eq!(seg.distance_to(&Point::new([-3.0, 4.0])), 5.0);
    assert_eq!(seg.distance_to(&Point::new([7.0, -4.0])), 5.0);
    assert_eq!(seg.midpoint(), Point::new([2.0, 0.0]));
  }

  #[test]
  fn degenerate_segment_distance() {
    let a = Point::new([1.0, 1.0]);
    let seg = LineSegmentView::new(&a, &a);
    assert_eq!(seg.squared_distance_to(&Point::new([4.0, 5.0])), 25.0);
  }

  #[test]
  fn encroachment() {
    let a = Point::new([0.0, 0.0]);
    let b = Point::new([2.0, 0.0]);
    let seg = LineSegmentView::new(&a, &b);
    assert!(seg.diametral_encroached_by(&Point::new([1.0, 0.5])));
    assert!(!seg.diametral_encroached_by(&Point::new([1.0, 1.0])));
    assert!(!seg.diametral_encroached_by(&Point::new([1.0, 2.0])));
  }

  #[test]
  fn crossings() {
    let pts = [
      Point::new([0.0, 0.0]),
      Point::new([2.0, 2.0]),
      Point::new([0.0, 2.0]),
      Point::new([2.0, 0.0]),
      Point::new([1.0, 1.0]),
    ];
    let diag1 = LineSegmentView::new(&pts[0], &pts[1]);
    let diag2 = LineSegmentView::new(&pts[2], &pts[3]);
    assert!(diag1.crosses(&diag2));
    let touching = LineSegmentView::new(&pts[4], &pts[3]);
    assert!(!diag1.crosses(&touching));
    assert!(diag1.contains_interior(&pts[4]));
    assert!(!diag1.contains_interior(&pts[0]));
  }
}

use super::Point;

/// Axis-aligned bounding box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
  pub min: Point<f64, 2>,
  pub max: Point<f64, 2>,
}

impl Aabb {
  pub fn new(min: Point<f64, 2>, max: Point<f64, 2>) -> Aabb {
    Aabb { min, max }
  }

  pub fn from_points(a: &Point<f64, 2>, b: &Point<f64, 2>) -> Aabb {
    Aabb {
      min: Point::new([a[0].min(b[0]), a[1].min(b[1])]),
      max: Point::new([a[0].max(b[0]), a[1].max(b[1])]),
    }
  }

  /// Smallest box enclosing every point, or `None` for an empty iterator.
  pub fn enclosing<'a, I>(points: I) -> Option<Aabb>
  where
    I: IntoIterator<Item = &'a Point<f64, 2>>,
  {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    Some(iter.fold(Aabb::from_points(first, first), |acc, pt| {
      acc.union(&Aabb::from_points(pt, pt))
    }))
  }

  #[must_use]
  pub fn union(&self, other: &Aabb) -> Aabb {
    Aabb {
      min: Point::new([self.min[0].min(other.min[0]), self.min[1].min(other.min[1])]),
      max: Point::new([self.max[0].max(other.max[0]), self.max[1].max(other.max[1])]),
    }
  }

  pub fn intersects(&self, other: &Aabb) -> bool {
    (0..2).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
  }

  /// Inclusive containment of another box.
  pub fn contains(&self, other: &Aabb) -> bool {
    (0..2).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
  }

  pub fn center(&self, i: usize) -> f64 {
    (self.min[i] + self.max[i]) / 2.0
  }

  pub fn extent(&self, i: usize) -> f64 {
    self.max[i] - self.min[i]
  }

  pub fn longest_axis(&self) -> usize {
    if self.extent(0) >= self.extent(1) {
      0
    } else {
      1
    }
  }

  pub fn diagonal(&self) -> f64 {
    self.min.euclidean_distance(&self.max)
  }

  /// Squared distance from `pt` to the closest point of the box. Zero when
  /// the point is inside.
  pub fn squared_distance_to(&self, pt: &Point<f64, 2>) -> f64 {
    (0..2)
      .map(|i| {
        let d = (self.min[i] - pt[i]).max(0.0).max(pt[i] - self.max[i]);
        d * d
      })
      .sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn union_and_containment() {
    let a = Aabb::from_points(&Point::new([0.0, 1.0]), &Point::new([2.0, -1.0]));
    assert_eq!(a.min, Point::new([0.0, -1.0]));
    assert_eq!(a.max, Point::new([2.0, 1.0]));

    let b = Aabb::from_points(&Point::new([0.5, -0.5]), &Point::new([3.0, 0.5]));
    let u = a.union(&b);
    assert_eq!(u.max, Point::new([3.0, 1.0]));
    assert!(u.contains(&a));
    assert!(u.contains(&b));
    assert!(!a.contains(&b));
    assert!(a.intersects(&b));
    assert_eq!(u.longest_axis(), 0);
  }

  #[test]
  fn point_distance() {
    let a = Aabb::new(Point::new([0.0, 0.0]), Point::new([2.0, 2.0]));
    assert_eq!(a.squared_distance_to(&Point::new([1.0, 1.0])), 0.0);
    assert_eq!(a.squared_distance_to(&Point::new([5.0, 1.0])), 9.0);
    assert_eq!(a.squared_distance_to(&Point::new([5.0, 6.0])), 25.0);
  }

  #[test]
  fn enclosing_points() {
    let pts = [
      Point::new([1.0, 5.0]),
      Point::new([-2.0, 0.0]),
      Point::new([3.0, 1.0]),
    ];
    let b = Aabb::enclosing(&pts).unwrap();
    assert_eq!(b.min, Point::new([-2.0, 0.0]));
    assert_eq!(b.max, Point::new([3.0, 5.0]));
    assert!(Aabb::enclosing(&[]).is_none());
  }
}

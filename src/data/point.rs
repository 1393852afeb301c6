use array_init::array_init;
use num_traits::Float;
use std::ops::{Deref, Index, Sub};

use super::Vector;
use crate::Orientation;

/// A coordinate in `N` dimensions. The mesher only uses `Point<f64, 2>`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Point<T, const N: usize = 2> {
  pub array: [T; N],
}

impl<T, const N: usize> Point<T, N> {
  pub const fn new(array: [T; N]) -> Point<T, N> {
    Point { array }
  }
}

impl<T: Float, const N: usize> Point<T, N> {
  pub fn squared_euclidean_distance(&self, rhs: &Point<T, N>) -> T {
    (0..N).fold(T::zero(), |acc, i| {
      let diff = self.array[i] - rhs.array[i];
      acc + diff * diff
    })
  }

  pub fn euclidean_distance(&self, rhs: &Point<T, N>) -> T {
    self.squared_euclidean_distance(rhs).sqrt()
  }

  pub fn midpoint(&self, rhs: &Point<T, N>) -> Point<T, N> {
    let two = T::one() + T::one();
    Point::new(array_init(|i| (self.array[i] + rhs.array[i]) / two))
  }

  /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `rhs`.
  pub fn lerp(&self, rhs: &Point<T, N>, t: T) -> Point<T, N> {
    Point::new(array_init(|i| self.array[i] + (rhs.array[i] - self.array[i]) * t))
  }

  pub fn is_finite(&self) -> bool {
    self.array.iter().all(|c| c.is_finite())
  }
}

impl Point<f64, 2> {
  /// Exact orientation of the turn `self -> q -> r`.
  pub fn orientation(&self, q: &Point<f64, 2>, r: &Point<f64, 2>) -> Orientation {
    Orientation::new(&self.array, &q.array, &r.array)
  }
}

impl<T, const N: usize> Index<usize> for Point<T, N> {
  type Output = T;
  fn index(&self, key: usize) -> &T {
    &self.array[key]
  }
}

impl<T, const N: usize> Deref for Point<T, N> {
  type Target = [T; N];
  fn deref(&self) -> &[T; N] {
    &self.array
  }
}

impl<T, const N: usize> From<[T; N]> for Point<T, N> {
  fn from(array: [T; N]) -> Point<T, N> {
    Point { array }
  }
}

// &point - &point = vector
impl<'a, 'b, T, const N: usize> Sub<&'a Point<T, N>> for &'b Point<T, N>
where
  T: Sub<T, Output = T> + Copy,
{
  type Output = Vector<T, N>;

  fn sub(self, other: &'a Point<T, N>) -> Vector<T, N> {
    Vector(array_init(|i| self.array[i] - other.array[i]))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Orientation::*;

  use proptest::prelude::*;

  proptest! {
    #[test]
    fn squared_euclidean_distance_is_symmetric(
      x1 in -1e3..1e3f64, y1 in -1e3..1e3f64, x2 in -1e3..1e3f64, y2 in -1e3..1e3f64
    ) {
      let p = Point::new([x1, y1]);
      let q = Point::new([x2, y2]);
      prop_assert_eq!(p.squared_euclidean_distance(&q), q.squared_euclidean_distance(&p));
      prop_assert!(p.squared_euclidean_distance(&q) >= 0.0);
    }

    #[test]
    fn midpoint_is_equidistant(
      x1 in -1e3..1e3f64, y1 in -1e3..1e3f64, x2 in -1e3..1e3f64, y2 in -1e3..1e3f64
    ) {
      let p = Point::new([x1, y1]);
      let q = Point::new([x2, y2]);
      let m = p.midpoint(&q);
      let d = (m.euclidean_distance(&p) - m.euclidean_distance(&q)).abs();
      prop_assert!(d <= 1e-9 * (1.0 + p.euclidean_distance(&q)));
    }
  }

  #[test]
  fn turns() {
    let origin = Point::new([0.0, 0.0]);
    let up = Point::new([0.0, 1.0]);
    assert_eq!(
      origin.orientation(&Point::new([1.0, 1.0]), &Point::new([2.0, 2.0])),
      CoLinear
    );
    assert_eq!(origin.orientation(&up, &Point::new([2.0, 2.0])), ClockWise);
    assert_eq!(origin.orientation(&up, &Point::new([-2.0, 2.0])), CounterClockWise);
    assert_eq!(origin.orientation(&origin, &origin), CoLinear);
  }

  #[test]
  fn lerp_endpoints() {
    let p = Point::new([1.0, 2.0]);
    let q = Point::new([5.0, -2.0]);
    assert_eq!(p.lerp(&q, 0.0), p);
    assert_eq!(p.lerp(&q, 1.0), q);
    assert_eq!(p.midpoint(&q), Point::new([3.0, 0.0]));
    assert_eq!(&q - &p, Vector([4.0, -4.0]));
    assert!(!Point::new([f64::NAN, 0.0]).is_finite());
  }
}

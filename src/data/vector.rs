use num_traits::Float;
use std::ops::Index;

/// Displacement between two [`Point`](super::Point)s.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(transparent)]
pub struct Vector<T, const N: usize>(pub [T; N]);

impl<T: Float, const N: usize> Vector<T, N> {
  pub fn dot(&self, other: &Vector<T, N>) -> T {
    (0..N).fold(T::zero(), |acc, i| acc + self.0[i] * other.0[i])
  }

  pub fn squared_magnitude(&self) -> T {
    self.dot(self)
  }

  pub fn magnitude(&self) -> T {
    self.squared_magnitude().sqrt()
  }
}

impl<T: Float> Vector<T, 2> {
  /// z-component of the 3D cross product; twice the signed area spanned by
  /// the two vectors.
  pub fn cross(&self, other: &Vector<T, 2>) -> T {
    self.0[0] * other.0[1] - self.0[1] * other.0[0]
  }
}

impl<T, const N: usize> Index<usize> for Vector<T, N> {
  type Output = T;
  fn index(&self, index: usize) -> &T {
    &self.0[index]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn products() {
    let u = Vector([3.0, 4.0]);
    let v = Vector([-4.0, 3.0]);
    assert_eq!(u.magnitude(), 5.0);
    assert_eq!(u.dot(&v), 0.0);
    assert_eq!(u.cross(&v), 25.0);
    assert_eq!(v.cross(&u), -25.0);
  }
}

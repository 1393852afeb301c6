use std::cmp::Ordering;

use geometry_predicates::predicates::{incircle, orient2d};

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone)]
pub enum Orientation {
  CounterClockWise,
  ClockWise,
  CoLinear,
}

impl Orientation {
  /// Determine the direction you have to turn if you walk from `p1`
  /// to `p2` to `p3`.
  ///
  /// The answer is exact for every finite input: the sign is computed with
  /// Shewchuk's adaptive `orient2d` predicate.
  ///
  /// # Examples
  ///
  /// ```rust
  /// # use rgeometry_mesh::Orientation;
  /// let p1 = [0.0, 0.0];
  /// let p2 = [0.0, 1.0]; // One unit above p1.
  /// // (0,0) -> (0,1) -> (0,2) == Orientation::CoLinear
  /// assert!(Orientation::new(&p1, &p2, &[0.0, 2.0]).is_colinear());
  /// // (0,0) -> (0,1) -> (-1,2) == Orientation::CounterClockWise
  /// assert!(Orientation::new(&p1, &p2, &[-1.0, 2.0]).is_ccw());
  /// // (0,0) -> (0,1) -> (1,2) == Orientation::ClockWise
  /// assert!(Orientation::new(&p1, &p2, &[1.0, 2.0]).is_cw());
  /// ```
  pub fn new(p1: &[f64; 2], p2: &[f64; 2], p3: &[f64; 2]) -> Orientation {
    let det = orient2d(*p1, *p2, *p3);
    if det > 0.0 {
      Orientation::CounterClockWise
    } else if det < 0.0 {
      Orientation::ClockWise
    } else {
      Orientation::CoLinear
    }
  }

  pub fn is_colinear(self) -> bool {
    matches!(self, Orientation::CoLinear)
  }

  pub fn is_ccw(self) -> bool {
    matches!(self, Orientation::CounterClockWise)
  }

  pub fn is_cw(self) -> bool {
    matches!(self, Orientation::ClockWise)
  }

  #[must_use]
  pub fn then(self, other: Orientation) -> Orientation {
    match self {
      Orientation::CoLinear => other,
      _ => self,
    }
  }

  #[must_use]
  pub fn reverse(self) -> Orientation {
    match self {
      Orientation::CounterClockWise => Orientation::ClockWise,
      Orientation::ClockWise => Orientation::CounterClockWise,
      Orientation::CoLinear => Orientation::CoLinear,
    }
  }
}

/// Exact in-circle test.
///
/// With `a`, `b`, `c` in counter-clockwise order, returns `Greater` if `d`
/// lies strictly inside their circumcircle, `Less` if strictly outside and
/// `Equal` if the four points are cocircular.
///
/// ```rust
/// # use rgeometry_mesh::in_circle;
/// # use std::cmp::Ordering;
/// let (a, b, c) = ([0.0, 0.0], [2.0, 0.0], [0.0, 2.0]);
/// assert_eq!(in_circle(&a, &b, &c, &[1.0, 1.0]), Ordering::Greater);
/// assert_eq!(in_circle(&a, &b, &c, &[2.0, 2.0]), Ordering::Equal);
/// assert_eq!(in_circle(&a, &b, &c, &[3.0, 3.0]), Ordering::Less);
/// ```
pub fn in_circle(a: &[f64; 2], b: &[f64; 2], c: &[f64; 2], d: &[f64; 2]) -> Ordering {
  let det = incircle(*a, *b, *c, *d);
  det.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
  use super::*;

  use test_strategy::proptest;

  #[test]
  fn nearly_colinear_is_exact() {
    // Classic failure case for naive floating point orientation.
    let p = [0.5, 0.5];
    let q = [12.0, 12.0];
    let r = [24.0, 24.0];
    assert!(Orientation::new(&p, &q, &r).is_colinear());
    let r = [24.0, 24.000000000000004];
    assert!(Orientation::new(&p, &q, &r).is_ccw());
  }

  #[test]
  fn in_circle_sign_flips_with_winding() {
    let (a, b, c, d) = ([0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [1.0, 1.0]);
    assert_eq!(in_circle(&a, &b, &c, &d), Ordering::Greater);
    assert_eq!(in_circle(&a, &c, &b, &d), Ordering::Less);
  }

  #[proptest]
  fn reverse_is_involution(#[strategy(-100.0..100.0f64)] x: f64, #[strategy(-100.0..100.0f64)] y: f64) {
    let p = [0.0, 0.0];
    let q = [1.0, 0.0];
    let r = [x, y];
    let o = Orientation::new(&p, &q, &r);
    assert_eq!(o.reverse(), Orientation::new(&q, &p, &r));
    assert_eq!(o.reverse().reverse(), o);
  }
}

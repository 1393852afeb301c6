use super::{Point, Vector};
use crate::{Orientation, EPSILON};

/// Borrowed triangle. Most metric methods assume counter-clockwise order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleView<'a>([&'a Point<f64, 2>; 3]);

impl<'a> TriangleView<'a> {
  pub fn new(pts: [&'a Point<f64, 2>; 3]) -> TriangleView<'a> {
    TriangleView(pts)
  }

  pub fn points(&self) -> [&'a Point<f64, 2>; 3] {
    self.0
  }

  pub fn orientation(&self) -> Orientation {
    let [a, b, c] = self.0;
    Orientation::new(a, b, c)
  }

  pub fn signed_area(&self) -> f64 {
    let [a, b, c] = self.0;
    (b - a).cross(&(c - a)) / 2.0
  }

  pub fn centroid(&self) -> Point<f64, 2> {
    let [a, b, c] = self.0;
    Point::new([(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0])
  }

  pub fn edge_lengths_squared(&self) -> [f64; 3] {
    let [a, b, c] = self.0;
    [
      b.squared_euclidean_distance(c),
      c.squared_euclidean_distance(a),
      a.squared_euclidean_distance(b),
    ]
  }

  pub fn shortest_edge(&self) -> f64 {
    self
      .edge_lengths_squared()
      .into_iter()
      .fold(f64::INFINITY, f64::min)
      .sqrt()
  }

  pub fn longest_edge(&self) -> f64 {
    self
      .edge_lengths_squared()
      .into_iter()
      .fold(0.0, f64::max)
      .sqrt()
  }

  /// Center of the circumscribed circle. `None` when the triangle is too flat
  /// for the center to be meaningful.
  pub fn circumcenter(&self) -> Option<Point<f64, 2>> {
    let [a, b, c] = self.0;
    let ab: Vector<f64, 2> = b - a;
    let ac: Vector<f64, 2> = c - a;
    let d = 2.0 * ab.cross(&ac);
    let longest = self.edge_lengths_squared().into_iter().fold(0.0, f64::max);
    if d.abs() <= EPSILON * longest || !d.is_finite() {
      return None;
    }
    let ab2 = ab.squared_magnitude();
    let ac2 = ac.squared_magnitude();
    let ux = (ac[1] * ab2 - ab[1] * ac2) / d;
    let uy = (ab[0] * ac2 - ac[0] * ab2) / d;
    Some(Point::new([a[0] + ux, a[1] + uy]))
  }

  pub fn circumradius(&self) -> Option<f64> {
    let center = self.circumcenter()?;
    Some(center.euclidean_distance(self.0[0]))
  }

  /// Interior angles in degrees, indexed by vertex.
  pub fn angles(&self) -> [f64; 3] {
    let [a, b, c] = self.0;
    [angle_at(a, b, c), angle_at(b, c, a), angle_at(c, a, b)]
  }

  pub fn min_angle(&self) -> f64 {
    self.angles().into_iter().fold(180.0, f64::min)
  }

  pub fn max_angle(&self) -> f64 {
    self.angles().into_iter().fold(0.0, f64::max)
  }
}

// Angle at `p` between the rays towards `q` and `r`, in degrees.
fn angle_at(p: &Point<f64, 2>, q: &Point<f64, 2>, r: &Point<f64, 2>) -> f64 {
  let u = q - p;
  let v = r - p;
  u.cross(&v).abs().atan2(u.dot(&v)).to_degrees()
}

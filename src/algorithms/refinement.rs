//! Ruppert-style Delaunay refinement.
//!
//! Every triangle starts [`Unchecked`](TriangleState::Unchecked) and is
//! classified against the angle bound and the sizing field. Bad triangles are
//! queued and split at their circumcenters, largest first. Boundary
//! subsegments that are encroached (a vertex inside their diametral circle)
//! are split before any triangle, and a circumcenter that would encroach a
//! subsegment is replaced by a split of that subsegment.
use log::{debug, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use super::sizing::SizingField;
use super::triangulation::{ConstrainedTriangulation, Edge, Location, SubIdx, TriIdx, VertIdx, Walk};
use crate::data::Point;
use crate::{Error, EPSILON};

/// Minimum interior angle every output triangle must reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBounds {
  pub min_angle_degrees: f64,
}

impl QualityBounds {
  pub fn new(min_angle_degrees: f64) -> QualityBounds {
    QualityBounds { min_angle_degrees }
  }

  /// # Errors
  ///
  /// [`Error::InvalidConfiguration`] unless `0 < min_angle_degrees < 60`.
  pub fn validate(&self) -> Result<(), Error> {
    let angle = self.min_angle_degrees;
    if !(angle > 0.0 && angle < 60.0) {
      return Err(Error::configuration(format!(
        "minimum angle must be in (0, 60) degrees, got {}",
        angle
      )));
    }
    Ok(())
  }
}

/// Upper bound on attempted splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementBudget {
  pub max_steps: usize,
}

impl RefinementBudget {
  pub fn new(max_steps: usize) -> RefinementBudget {
    RefinementBudget { max_steps }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleState {
  Unchecked,
  Accepted,
  QueuedForSplit,
}

/// Counters of a finished refinement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefinementReport {
  pub steps: usize,
  pub steiner_points: usize,
  pub segment_splits: usize,
  pub refused_splits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct BadTriangle {
  radius: OrderedFloat<f64>,
  tri: Reverse<TriIdx>,
  vertices: [VertIdx; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SegmentSplit {
  ends: (VertIdx, VertIdx),
  // Split even if no current vertex encroaches: a prospective circumcenter
  // does.
  forced: bool,
}

/// Refines a [`ConstrainedTriangulation`] in place.
///
/// ```rust
/// # use rgeometry_mesh::data::*;
/// # use rgeometry_mesh::algorithms::sizing::*;
/// # use rgeometry_mesh::algorithms::refinement::*;
/// # use rgeometry_mesh::algorithms::triangulation::ConstrainedTriangulation;
/// let pslg = Pslg::load(&PolygonGeometry::new(
///   vec![[0.0, 0.0], [8.0, 0.0], [8.0, 8.0], [0.0, 8.0]],
///   vec![],
/// ))?;
/// let sizing = SizingField::new(&pslg, SizingParams::new(1.0, 2.0, 0.5, 4.0));
/// let mut cdt = ConstrainedTriangulation::new(&pslg)?;
/// let report = Refiner::new(&mut cdt, &sizing, QualityBounds::new(25.0), RefinementBudget::new(10_000))
///   .refine()?;
/// assert!(report.steiner_points > 0);
/// # Ok::<(), rgeometry_mesh::Error>(())
/// ```
pub struct Refiner<'a> {
  cdt: &'a mut ConstrainedTriangulation,
  sizing: &'a SizingField,
  min_angle: f64,
  max_steps: usize,
  states: Vec<TriangleState>,
  bad: BinaryHeap<BadTriangle>,
  segments: VecDeque<SegmentSplit>,
  report: RefinementReport,
}

impl<'a> Refiner<'a> {
  pub fn new(
    cdt: &'a mut ConstrainedTriangulation,
    sizing: &'a SizingField,
    quality: QualityBounds,
    budget: RefinementBudget,
  ) -> Refiner<'a> {
    let states = vec![TriangleState::Unchecked; cdt.network().triangles.len()];
    Refiner {
      cdt,
      sizing,
      min_angle: quality.min_angle_degrees,
      max_steps: budget.max_steps,
      states,
      bad: BinaryHeap::new(),
      segments: VecDeque::new(),
      report: RefinementReport::default(),
    }
  }

  pub fn state(&self, t: TriIdx) -> TriangleState {
    self
      .states
      .get(t.0)
      .copied()
      .unwrap_or(TriangleState::Unchecked)
  }

  /// Run until no triangle is queued for splitting.
  ///
  /// # Errors
  ///
  /// [`Error::RefinementStalled`] if the step budget runs out or a bad
  /// triangle cannot be split. The triangulation is left in a valid state and
  /// may still be exported by a caller that explicitly wants a partial mesh.
  pub fn refine(mut self) -> Result<RefinementReport, Error> {
    let initial: Vec<TriIdx> = self.cdt.network().live_triangles().collect();
    debug!("refining {} triangles", initial.len());
    self.classify(initial);

    let mut exhausted = false;
    loop {
      if self.report.steps >= self.max_steps {
        exhausted = true;
        break;
      }
      if let Some(split) = self.segments.pop_front() {
        if self.split_segment(split) {
          self.report.steps += 1;
        }
        continue;
      }
      let bad = match self.bad.pop() {
        Some(bad) => bad,
        None => break,
      };
      if !self.is_current(&bad) {
        continue;
      }
      self.report.steps += 1;
      self.split_triangle(bad);
    }
    self.cdt.network().check_invariant("post-refine");

    let remaining_bad = self
      .cdt
      .network()
      .live_triangles()
      .filter(|&t| self.is_bad(t))
      .count();
    if remaining_bad > 0 {
      warn!(
        "refinement stalled: {} bad triangles left after {} steps{}",
        remaining_bad,
        self.report.steps,
        if exhausted { " (budget exhausted)" } else { "" }
      );
      return Err(Error::RefinementStalled {
        remaining_bad,
        steiner_points: self.report.steiner_points,
      });
    }
    debug!(
      "refinement done: {} steiner points ({} on segments), {} steps",
      self.report.steiner_points, self.report.segment_splits, self.report.steps
    );
    Ok(self.report)
  }

  fn is_bad(&self, t: TriIdx) -> bool {
    let view = self.cdt.network().view(t);
    if view.min_angle() < self.min_angle {
      return true;
    }
    match view.circumradius() {
      Some(r) => r > self.sizing.size_at(&view.centroid()),
      None => true,
    }
  }

  fn is_current(&self, bad: &BadTriangle) -> bool {
    let tri = self.cdt.network().tri(bad.tri.0);
    tri.alive && tri.vertices == bad.vertices
  }

  // Unchecked -> Accepted | QueuedForSplit, and queue encroached subsegments.
  fn classify(&mut self, tris: Vec<TriIdx>) {
    let len = self.cdt.network().triangles.len();
    if self.states.len() < len {
      self.states.resize(len, TriangleState::Unchecked);
    }
    for t in tris {
      let tri = self.cdt.network().tri(t);
      if !tri.alive {
        continue;
      }
      let vertices = tri.vertices;
      self.states[t.0] = TriangleState::Unchecked;
      if self.is_bad(t) {
        let radius = self
          .cdt
          .network()
          .view(t)
          .circumradius()
          .unwrap_or(f64::INFINITY);
        self.bad.push(BadTriangle {
          radius: OrderedFloat(radius),
          tri: Reverse(t),
          vertices,
        });
        self.states[t.0] = TriangleState::QueuedForSplit;
      } else {
        self.states[t.0] = TriangleState::Accepted;
      }
      for sub in (0..3).map(SubIdx) {
        let e = Edge::new(t, sub);
        if self.cdt.network().is_constrained(e) && self.is_encroached(e) {
          self.segments.push_back(SegmentSplit {
            ends: self.cdt.network().endpoints(e),
            forced: false,
          });
        }
      }
    }
  }

  fn after_insert(&mut self) {
    let touched = self.cdt.network_mut().take_touched();
    self.classify(touched);
  }

  fn is_encroached(&self, e: Edge) -> bool {
    let net = self.cdt.network();
    let seg = net.segment(e);
    let apexes = std::iter::once(e).chain(net.edge_duel(&e));
    apexes
      .map(|side| net.apex(side))
      .any(|v| seg.diametral_encroached_by(net.vert(v)))
  }

  fn refuse(&mut self, t: TriIdx, why: &str) {
    warn!("cannot split {:?}: {}", t, why);
    self.report.refused_splits += 1;
  }

  fn split_triangle(&mut self, bad: BadTriangle) {
    let t = bad.tri.0;
    let net = self.cdt.network();
    let view = net.view(t);
    let center = match view.circumcenter() {
      Some(c) => c,
      None => return self.refuse(t, "degenerate circumcircle"),
    };
    let from = view.centroid();
    let shortest = view.shortest_edge();

    let loc = match net.walk(t, &from, &center) {
      None => return self.refuse(t, "walk did not settle"),
      Some(Walk::Blocked(e)) => {
        let ends = net.endpoints(e);
        if self.segment_split_point(ends).is_none() {
          return self.refuse(t, "blocking subsegment is too short to split");
        }
        self.segments.push_back(SegmentSplit { ends, forced: true });
        self.bad.push(bad);
        return;
      }
      Some(Walk::Reached(loc)) => loc,
    };

    let host = match loc {
      Location::InTriangle(host) => host,
      Location::OnEdge(e) => e.tri,
      Location::OnVertex(_) | Location::Outside(_) => {
        return self.refuse(t, "circumcenter coincides with a vertex")
      }
    };
    let tol = (EPSILON * shortest).max(self.cdt.resolution());
    if net
      .tri(host)
      .vertices
      .iter()
      .any(|&v| net.vert(v).euclidean_distance(&center) <= tol)
    {
      return self.refuse(t, "circumcenter is too close to a vertex");
    }

    let (_, walls) = net.cavity(loc, &center);
    let encroached: Vec<(VertIdx, VertIdx)> = walls
      .into_iter()
      .filter(|&e| net.segment(e).diametral_encroached_by(&center))
      .map(|e| net.endpoints(e))
      .collect();
    if !encroached.is_empty() {
      let splittable: Vec<(VertIdx, VertIdx)> = encroached
        .into_iter()
        .filter(|&ends| self.segment_split_point(ends).is_some())
        .collect();
      if splittable.is_empty() {
        return self.refuse(t, "encroached subsegments are too short to split");
      }
      for ends in splittable {
        self
          .segments
          .push_back(SegmentSplit { ends, forced: true });
      }
      self.bad.push(bad);
      return;
    }

    let net = self.cdt.network_mut();
    let v = net.add_vert(center);
    net.insert_at(v, loc);
    self.report.steiner_points += 1;
    self.after_insert();
  }

  // Returns true if a split was attempted.
  fn split_segment(&mut self, split: SegmentSplit) -> bool {
    let (a, b) = split.ends;
    let net = self.cdt.network();
    let e = match net.find_edge(a, b) {
      Some(e) if net.is_constrained(e) => e,
      _ => return false,
    };
    if !split.forced && !self.is_encroached(e) {
      return false;
    }
    let p = match self.segment_split_point((a, b)) {
      Some(p) => p,
      None => {
        warn!("segment {:?}-{:?} is too short to split", a, b);
        self.report.refused_splits += 1;
        return true;
      }
    };

    let net = self.cdt.network_mut();
    let m = net.add_vert(p);
    net.insert_at(m, Location::OnEdge(e));
    self.report.steiner_points += 1;
    self.report.segment_splits += 1;
    self.after_insert();
    true
  }

  // None when the split point would land within the resolution (or the
  // relative tolerance of the subsegment) of either endpoint.
  fn segment_split_point(&self, (a, b): (VertIdx, VertIdx)) -> Option<Point<f64>> {
    let net = self.cdt.network();
    let (pa, pb) = (net.vert(a), net.vert(b));
    let p = self.split_point(a, b);
    let tol = (EPSILON * pa.euclidean_distance(pb)).max(self.cdt.resolution());
    if p == *pa || p == *pb || pa.euclidean_distance(&p) <= tol || pb.euclidean_distance(&p) <= tol {
      return None;
    }
    Some(p)
  }

  // Midpoint, except that a subsegment with exactly one input endpoint is
  // split on a power-of-two shell around that endpoint. Shells keep
  // neighboring segments that meet at a small angle from chasing each other.
  fn split_point(&self, a: VertIdx, b: VertIdx) -> Point<f64> {
    let net = self.cdt.network();
    let (pa, pb) = (net.vert(a), net.vert(b));
    let (a_in, b_in) = (self.cdt.is_input_vertex(a), self.cdt.is_input_vertex(b));
    if a_in == b_in {
      return pa.midpoint(pb);
    }
    let (origin, other) = if a_in { (pa, pb) } else { (pb, pa) };
    let len = origin.euclidean_distance(other);
    let shell = (len / 2.0).log2().round().exp2();
    origin.lerp(other, shell / len)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::algorithms::sizing::SizingParams;
  use crate::data::{PolygonGeometry, Pslg};
  use claims::{assert_err, assert_matches, assert_ok};

  fn setup(
    outer: Vec<[f64; 2]>,
    holes: Vec<Vec<[f64; 2]>>,
    params: SizingParams,
  ) -> (ConstrainedTriangulation, SizingField) {
    let pslg = Pslg::load(&PolygonGeometry::new(outer, holes)).unwrap();
    let sizing = SizingField::new(&pslg, params);
    (ConstrainedTriangulation::new(&pslg).unwrap(), sizing)
  }

  fn square(side: f64) -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [side, 0.0], [side, side], [0.0, side]]
  }

  #[test]
  fn quality_bounds_validation() {
    assert_ok!(QualityBounds::new(20.0).validate());
    assert_err!(QualityBounds::new(0.0).validate());
    assert_err!(QualityBounds::new(60.0).validate());
    assert_err!(QualityBounds::new(f64::NAN).validate());
  }

  #[test]
  fn square_meets_bounds() {
    let (mut cdt, sizing) = setup(square(10.0), vec![], SizingParams::new(1.0, 3.0, 0.5, 5.0));
    let report = assert_ok!(Refiner::new(
      &mut cdt,
      &sizing,
      QualityBounds::new(25.0),
      RefinementBudget::new(50_000)
    )
    .refine());
    assert!(report.steiner_points > 0);
    let net = cdt.network();
    for t in net.live_triangles() {
      let view = net.view(t);
      assert!(view.min_angle() >= 25.0 - 1e-9);
      let r = view.circumradius().unwrap();
      assert!(r <= sizing.size_at(&view.centroid()) + 1e-9);
    }
    let area: f64 = net.live_triangles().map(|t| net.view(t).signed_area()).sum();
    assert!((area - 100.0).abs() < 1e-6);
  }

  #[test]
  fn holes_stay_empty() {
    let (mut cdt, sizing) = setup(
      square(20.0),
      vec![vec![[8.0, 8.0], [12.0, 8.0], [12.0, 12.0], [8.0, 12.0]]],
      SizingParams::new(1.0, 4.0, 0.5, 10.0),
    );
    assert_ok!(Refiner::new(
      &mut cdt,
      &sizing,
      QualityBounds::new(20.0),
      RefinementBudget::new(50_000)
    )
    .refine());
    let net = cdt.network();
    for t in net.live_triangles() {
      let c = net.view(t).centroid();
      assert!(!(c[0] > 8.0 && c[0] < 12.0 && c[1] > 8.0 && c[1] < 12.0));
    }
    let area: f64 = net.live_triangles().map(|t| net.view(t).signed_area()).sum();
    assert!((area - 384.0).abs() < 1e-6);
  }

  #[test]
  fn tiny_budget_stalls() {
    let (mut cdt, sizing) = setup(square(10.0), vec![], SizingParams::new(0.5, 0.5, 0.0, 0.0));
    let err = assert_err!(Refiner::new(
      &mut cdt,
      &sizing,
      QualityBounds::new(20.0),
      RefinementBudget::new(3)
    )
    .refine());
    match err {
      Error::RefinementStalled {
        remaining_bad,
        steiner_points,
      } => {
        assert!(remaining_bad > 0);
        assert!(steiner_points <= 3);
      }
      other => panic!("unexpected {:?}", other),
    }
    // Still a valid triangulation that covers the square.
    let net = cdt.network();
    net.check_invariant("stalled");
    let area: f64 = net.live_triangles().map(|t| net.view(t).signed_area()).sum();
    assert!((area - 100.0).abs() < 1e-6);
  }

  #[test]
  fn states_after_classification() {
    let (mut cdt, sizing) = setup(square(1.0), vec![], SizingParams::new(10.0, 10.0, 0.0, 1.0));
    let tris: Vec<TriIdx> = cdt.network().live_triangles().collect();
    let mut refiner = Refiner::new(
      &mut cdt,
      &sizing,
      QualityBounds::new(20.0),
      RefinementBudget::new(10),
    );
    assert!(tris.iter().all(|&t| refiner.state(t) == TriangleState::Unchecked));
    refiner.classify(tris.clone());
    // Two right isosceles triangles are fine at 45 degrees and small size.
    assert!(tris.iter().all(|&t| refiner.state(t) == TriangleState::Accepted));
    let report = assert_ok!(refiner.refine());
    assert_eq!(report.steiner_points, 0);
  }

  #[test]
  fn concentric_shell_split_point() {
    let (mut cdt, sizing) = setup(square(10.0), vec![], SizingParams::new(1.0, 1.0, 0.0, 0.0));
    let steiner = cdt.network_mut().add_vert(Point::new([6.0, 0.0]));
    let refiner = Refiner::new(
      &mut cdt,
      &sizing,
      QualityBounds::new(20.0),
      RefinementBudget::new(10),
    );
    let corner = VertIdx::from(crate::data::PointId(0));
    let shell = Point::new([4.0, 0.0]);
    // Half of 6 is 3; the nearest power of two is 4.
    assert!(refiner.split_point(corner, steiner).euclidean_distance(&shell) < 1e-12);
    assert!(refiner.split_point(steiner, corner).euclidean_distance(&shell) < 1e-12);
    let other = VertIdx::from(crate::data::PointId(1));
    assert_eq!(refiner.split_point(corner, other), Point::new([5.0, 0.0]));
  }

  #[test]
  fn split_guard_has_a_floor() {
    let (mut cdt, sizing) = setup(square(10.0), vec![], SizingParams::new(1.0, 1.0, 0.0, 0.0));
    assert!(cdt.resolution() > 0.0);
    let near = cdt.network_mut().add_vert(Point::new([1e-12, 0.0]));
    let refiner = Refiner::new(
      &mut cdt,
      &sizing,
      QualityBounds::new(20.0),
      RefinementBudget::new(10),
    );
    let corner = VertIdx::from(crate::data::PointId(0));
    let other = VertIdx::from(crate::data::PointId(1));
    // Far below the resolution even though it is long relative to itself.
    assert_eq!(refiner.segment_split_point((corner, near)), None);
    assert_eq!(
      refiner.segment_split_point((corner, other)),
      Some(Point::new([5.0, 0.0]))
    );
  }

  fn spiky_star(tips: usize, inner: f64, outer: f64) -> Vec<[f64; 2]> {
    (0..2 * tips)
      .map(|i| {
        let angle = std::f64::consts::PI * i as f64 / tips as f64;
        let r = if i % 2 == 0 { outer } else { inner };
        [r * angle.cos(), r * angle.sin()]
      })
      .collect()
  }

  // Input angles of a few degrees can never meet a 20 degree bound. The
  // refiner has to give up on them without stacking vertices on top of each
  // other, and the triangulation it leaves behind must stay valid.
  #[test]
  fn sharp_corners_stall_cleanly() {
    let shapes = vec![
      vec![[0.0, 0.0], [10.0, 0.0], [10.0, 0.5]],
      spiky_star(7, 1.0, 10.0),
      // Dart with an 11 degree nose and two 2 degree barbs.
      vec![[0.0, 0.0], [10.0, -1.0], [3.0, 0.0], [10.0, 1.0]],
    ];
    for outer in shapes {
      let (mut cdt, sizing) = setup(outer.clone(), vec![], SizingParams::new(1.2, 4.8, 0.6, 10.0));
      let err = assert_err!(Refiner::new(
        &mut cdt,
        &sizing,
        QualityBounds::new(20.0),
        RefinementBudget::new(20_000)
      )
      .refine());
      assert_matches!(err, Error::RefinementStalled { remaining_bad, .. } if remaining_bad > 0);

      let net = cdt.network();
      net.check_invariant("stalled at a sharp corner");
      for t in net.live_triangles() {
        let view = net.view(t);
        assert!(view.orientation().is_ccw(), "{:?} in {:?}", view.points(), outer);
        assert!(view.signed_area() > 0.0);
        let [a, b, c] = view.points();
        assert!(a != b && b != c && c != a);
      }
    }
  }
}

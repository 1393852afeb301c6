use log::info;
use serde::{Deserialize, Serialize};

use crate::algorithms::refinement::{QualityBounds, RefinementBudget, RefinementReport, Refiner};
use crate::algorithms::sizing::{SizingField, SizingParams};
use crate::algorithms::triangulation::ConstrainedTriangulation;
use crate::data::{Geometry, Pslg};
use crate::export::Mesh;
use crate::Error;

/// Everything the pipeline needs besides the geometry. All fields are
/// required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshOptions {
  pub sizing: SizingParams,
  pub quality: QualityBounds,
  pub budget: RefinementBudget,
}

impl MeshOptions {
  /// # Errors
  ///
  /// [`Error::InvalidConfiguration`] if the sizing ramp or the angle bound is
  /// out of range.
  pub fn validate(&self) -> Result<(), Error> {
    self.sizing.validate()?;
    self.quality.validate()
  }
}

/// One meshing request: a loaded PSLG, its sizing field and the
/// triangulation being refined. Owned by the caller and dropped with it.
///
/// Use this instead of [`generate_mesh`] to keep the last valid state after
/// [`Error::RefinementStalled`]:
///
/// ```rust
/// # use rgeometry_mesh::*;
/// # use rgeometry_mesh::data::*;
/// # use rgeometry_mesh::algorithms::*;
/// let sliver = Geometry::Polygon(PolygonGeometry::new(
///   vec![[0.0, 0.0], [100.0, 0.0], [100.0, 0.01], [0.0, 0.01]],
///   vec![],
/// ));
/// let options = MeshOptions {
///   sizing: SizingParams::new(1.0, 4.0, 0.5, 10.0),
///   quality: QualityBounds::new(20.0),
///   budget: RefinementBudget::new(200),
/// };
/// let mut session = MeshSession::new(&sliver, &options)?;
/// assert!(session.export().is_none());
/// if let Err(err) = session.refine() {
///   assert!(matches!(err, Error::RefinementStalled { .. }));
///   let partial = session.export().unwrap();
///   assert!(!partial.is_empty());
/// }
/// # Ok::<(), Error>(())
/// ```
#[derive(Debug)]
pub struct MeshSession {
  options: MeshOptions,
  pslg: Pslg,
  sizing: SizingField,
  cdt: ConstrainedTriangulation,
  refined: bool,
}

impl MeshSession {
  /// Validate `options`, load `geometry` and build its constrained Delaunay
  /// triangulation.
  pub fn new(geometry: &Geometry, options: &MeshOptions) -> Result<MeshSession, Error> {
    options.validate()?;
    let pslg = Pslg::from_geometry(geometry)?;
    let sizing = SizingField::new(&pslg, options.sizing);
    let cdt = ConstrainedTriangulation::new(&pslg)?;
    Ok(MeshSession {
      options: *options,
      pslg,
      sizing,
      cdt,
      refined: false,
    })
  }

  pub fn pslg(&self) -> &Pslg {
    &self.pslg
  }

  pub fn sizing(&self) -> &SizingField {
    &self.sizing
  }

  pub fn triangulation(&self) -> &ConstrainedTriangulation {
    &self.cdt
  }

  /// Refine in place. After [`Error::RefinementStalled`] the triangulation is
  /// still valid and [`export`](Self::export) returns the last accepted
  /// state.
  pub fn refine(&mut self) -> Result<RefinementReport, Error> {
    let result = Refiner::new(
      &mut self.cdt,
      &self.sizing,
      self.options.quality,
      self.options.budget,
    )
    .refine();
    self.refined = matches!(result, Ok(_) | Err(Error::RefinementStalled { .. }));
    result
  }

  /// The refined mesh, or the partial one after a stall. `None` until
  /// [`refine`](Self::refine) has run.
  pub fn export(&self) -> Option<Mesh> {
    self.refined.then(|| Mesh::export(&self.cdt))
  }
}

/// Load, triangulate, refine and export `geometry`.
///
/// # Errors
///
/// Any [`Error`] kind. The configuration is checked before the geometry is
/// touched, and a stalled refinement is an error rather than a partial mesh.
pub fn generate_mesh(geometry: &Geometry, options: &MeshOptions) -> Result<Mesh, Error> {
  let mut session = MeshSession::new(geometry, options)?;
  let report = session.refine()?;
  let mesh = Mesh::export(session.triangulation());
  info!(
    "meshed {} points into {} triangles ({} steiner points in {} steps)",
    mesh.points.len(),
    mesh.triangles.len(),
    report.steiner_points,
    report.steps
  );
  Ok(mesh)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::{LineSegment, Point, PolygonGeometry, TriangleView};
  use crate::testing::*;
  use crate::{in_circle, Orientation};
  use claims::{assert_err, assert_matches, assert_none, assert_ok, assert_some};
  use proptest::prelude::ProptestConfig;
  use std::cmp::Ordering;
  use std::collections::HashMap;
  use test_strategy::proptest;

  fn options(size_min: f64, size_max: f64) -> MeshOptions {
    MeshOptions {
      sizing: SizingParams::new(size_min, size_max, 0.5 * size_min, 5.0 * size_max),
      quality: QualityBounds::new(20.0),
      budget: RefinementBudget::new(200_000),
    }
  }

  fn l_shape() -> Geometry {
    PolygonGeometry::new(
      vec![
        [0.0, 0.0],
        [20.0, 0.0],
        [20.0, 10.0],
        [10.0, 10.0],
        [10.0, 20.0],
        [0.0, 20.0],
      ],
      vec![],
    )
    .into()
  }

  #[test]
  fn l_shape_meshes() {
    let mesh = assert_ok!(generate_mesh(&l_shape(), &options(1.5, 5.0)));
    let stats = mesh.stats();
    assert!((stats.area - 300.0).abs() < 1e-6);
    assert!(stats.min_angle >= 20.0 - 1e-9);
    assert_eq!(stats.holes, 0);
  }

  #[test]
  fn inverted_sizes_fail_before_loading() {
    // The geometry is invalid too; configuration is checked first.
    let bad = PolygonGeometry::new(vec![[0.0, 0.0], [1.0, 1.0]], vec![]).into();
    let err = assert_err!(generate_mesh(&bad, &options(5.0, 1.0)));
    assert_matches!(err, Error::InvalidConfiguration { .. });
  }

  #[test]
  fn options_from_json() {
    let json = r#"{
      "sizing": { "size_min": 1.5, "size_max": 5.0, "dist_min": 0.75, "dist_max": 25.0 },
      "quality": { "min_angle_degrees": 20.0 },
      "budget": { "max_steps": 1000 }
    }"#;
    let parsed: MeshOptions = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.sizing, SizingParams::new(1.5, 5.0, 0.75, 25.0));
    assert_eq!(parsed.budget.max_steps, 1000);
    assert_ok!(parsed.validate());
    // No defaults: a missing section is an error.
    assert_err!(serde_json::from_str::<MeshOptions>(r#"{ "sizing": null }"#));
  }

  #[test]
  fn session_exposes_stages() {
    let mut session = assert_ok!(MeshSession::new(&l_shape(), &options(2.0, 6.0)));
    assert_eq!(session.pslg().points().len(), 6);
    assert_eq!(session.triangulation().live_triangles().count(), 4);
    // Nothing to export before refinement has run.
    assert_none!(session.export());
    assert_ok!(session.refine());
    let mesh = assert_some!(session.export());
    assert!(mesh.triangles.len() > 4);
    assert_eq!(mesh.triangles.len(), session.triangulation().live_triangles().count());
  }

  fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    let twice: f64 = (0..n)
      .map(|i| {
        let (p, q) = (ring[i], ring[(i + 1) % n]);
        p[0] * q[1] - q[0] * p[1]
      })
      .sum();
    (twice / 2.0).abs()
  }

  // Counter-clockwise triangles, and every edge shared by two triangles is
  // locally Delaunay.
  fn assert_valid_triangulation(mesh: &Mesh) {
    let p = &mesh.points;
    let mut opposite: HashMap<(usize, usize), usize> = HashMap::new();
    for &[a, b, c] in &mesh.triangles {
      assert!(
        Orientation::new(&p[a], &p[b], &p[c]).is_ccw(),
        "{:?} is not counter-clockwise",
        [p[a], p[b], p[c]]
      );
      opposite.insert((a, b), c);
      opposite.insert((b, c), a);
      opposite.insert((c, a), b);
    }
    for (&(a, b), &c) in &opposite {
      if let Some(&d) = opposite.get(&(b, a)) {
        assert_ne!(in_circle(&p[a], &p[b], &p[c], &p[d]), Ordering::Greater);
      }
    }
  }

  // Each boundary edge lies on a ring edge, and together they cover every
  // ring edge exactly once.
  fn assert_boundary_matches(mesh: &Mesh, polygon: &PolygonGeometry) {
    let input: Vec<LineSegment> = std::iter::once(&polygon.outer)
      .chain(&polygon.holes)
      .flat_map(|ring| {
        (0..ring.len()).map(move |i| {
          LineSegment::new(Point::new(ring[i]), Point::new(ring[(i + 1) % ring.len()]))
        })
      })
      .collect();
    let mut covered = vec![0.0; input.len()];
    for [i, j] in mesh.boundary_edges() {
      let (p, q) = (Point::new(mesh.points[i]), Point::new(mesh.points[j]));
      let off = |seg: &LineSegment| seg.as_ref().distance_to(&p).max(seg.as_ref().distance_to(&q));
      let (k, seg) = input
        .iter()
        .enumerate()
        .min_by(|x, y| off(x.1).total_cmp(&off(y.1)))
        .unwrap();
      assert!(off(seg) < 1e-9, "boundary edge {:?}-{:?} is off the input", p, q);
      covered[k] += p.euclidean_distance(&q);
    }
    for (seg, len) in input.iter().zip(covered) {
      assert!((seg.as_ref().length() - len).abs() < 1e-6);
    }
  }

  // Refine `polygon` and check what must hold whether or not refinement
  // finishes.
  fn refine_and_check(polygon: &PolygonGeometry, sizing: SizingParams) -> Mesh {
    let options = MeshOptions {
      sizing,
      quality: QualityBounds::new(20.0),
      budget: RefinementBudget::new(20_000),
    };
    let geometry = Geometry::Polygon(polygon.clone());
    let mut session = assert_ok!(MeshSession::new(&geometry, &options));
    let result = session.refine();
    let mesh = assert_some!(session.export());
    match result {
      Ok(_) => {
        for &[a, b, c] in &mesh.triangles {
          let pts = [a, b, c].map(|i| Point::new(mesh.points[i]));
          let view = TriangleView::new([&pts[0], &pts[1], &pts[2]]);
          assert!(view.min_angle() >= 20.0 - 1e-9);
          let radius = view.circumradius().unwrap();
          assert!(radius <= session.sizing().size_at(&view.centroid()) + 1e-9);
        }
      }
      Err(err) => {
        assert_matches!(err, Error::RefinementStalled { remaining_bad, .. } if remaining_bad > 0)
      }
    }
    assert_valid_triangulation(&mesh);
    assert_boundary_matches(&mesh, polygon);
    let area = ring_area(&polygon.outer) - polygon.holes.iter().map(|h| ring_area(h)).sum::<f64>();
    assert!((mesh.stats().area - area).abs() < 1e-6 * area.max(1.0));
    mesh
  }

  #[test]
  fn sharp_dart_leaves_valid_partial_mesh() {
    let dart = PolygonGeometry::new(
      vec![[0.0, 0.0], [10.0, -1.0], [3.0, 0.0], [10.0, 1.0]],
      vec![],
    );
    let mesh = refine_and_check(&dart, SizingParams::new(1.2, 4.8, 0.6, 10.0));
    assert!(mesh.stats().min_angle > 0.0);
  }

  #[proptest(ProptestConfig { cases: 24, ..ProptestConfig::default() })]
  fn refined_stars_are_valid(
    #[strategy(star_polygon(3..20))] outer: Vec<[f64; 2]>,
    #[strategy(sizing_params())] sizing: SizingParams,
  ) {
    refine_and_check(&PolygonGeometry::new(outer, vec![]), sizing);
  }

  #[proptest(ProptestConfig { cases: 24, ..ProptestConfig::default() })]
  fn refined_holes_stay_empty(
    #[strategy(polygon_with_hole(5..24))] polygon: PolygonGeometry,
    #[strategy(sizing_params())] sizing: SizingParams,
  ) {
    let half = polygon.holes[0][1][0];
    let mesh = refine_and_check(&polygon, sizing);
    assert_eq!(mesh.stats().holes, 1);
    for &[a, b, c] in &mesh.triangles {
      let [cx, cy] = [0, 1].map(|k| (mesh.points[a][k] + mesh.points[b][k] + mesh.points[c][k]) / 3.0);
      assert!(!(cx.abs() < half && cy.abs() < half), "centroid ({}, {}) in the hole", cx, cy);
    }
  }
}

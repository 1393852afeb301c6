//! Flat, renderer-friendly mesh output.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::algorithms::triangulation::ConstrainedTriangulation;
use crate::data::{Point, TriangleView};

/// Compacted points plus counter-clockwise triangles indexing into them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
  pub points: Vec<[f64; 2]>,
  pub triangles: Vec<[usize; 3]>,
}

/// Summary numbers for a [`Mesh`]. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshStats {
  pub points: usize,
  pub triangles: usize,
  pub holes: usize,
  pub area: f64,
  pub min_angle: f64,
  pub max_angle: f64,
  pub min_edge: f64,
  pub max_edge: f64,
}

impl Mesh {
  /// Copy out the live triangles of `cdt`. Super-triangle and unreferenced
  /// vertices are dropped; the remaining ones keep their relative order.
  pub fn export(cdt: &ConstrainedTriangulation) -> Mesh {
    let n = cdt.points().len();
    let mut used = vec![false; n];
    let tris: Vec<_> = cdt.live_triangles().collect();
    for tri in &tris {
      for v in tri {
        used[v.0] = true;
      }
    }
    let mut remap = vec![usize::MAX; n];
    let mut points = Vec::new();
    for (idx, pt) in cdt.points().iter().enumerate() {
      if used[idx] {
        remap[idx] = points.len();
        points.push(pt.array);
      }
    }
    let triangles = tris
      .iter()
      .map(|[a, b, c]| [remap[a.0], remap[b.0], remap[c.0]])
      .collect();
    Mesh { points, triangles }
  }

  pub fn is_empty(&self) -> bool {
    self.triangles.is_empty()
  }

  /// Edges that belong to exactly one triangle, directed the way that
  /// triangle walks them (domain on the left). Sorted.
  pub fn boundary_edges(&self) -> Vec<[usize; 2]> {
    let mut uses: BTreeMap<(usize, usize), ([usize; 2], usize)> = BTreeMap::new();
    for &[a, b, c] in &self.triangles {
      for (src, dst) in [(a, b), (b, c), (c, a)] {
        let key = (src.min(dst), src.max(dst));
        uses.entry(key).or_insert(([src, dst], 0)).1 += 1;
      }
    }
    let mut edges: Vec<[usize; 2]> = uses
      .into_values()
      .filter(|&(_, count)| count == 1)
      .map(|(edge, _)| edge)
      .collect();
    edges.sort_unstable();
    edges
  }

  pub fn stats(&self) -> MeshStats {
    let points: Vec<Point<f64>> = self.points.iter().map(|&p| Point::new(p)).collect();
    let mut stats = MeshStats {
      points: self.points.len(),
      triangles: self.triangles.len(),
      ..MeshStats::default()
    };
    if self.triangles.is_empty() {
      return stats;
    }

    let mut edges = BTreeMap::new();
    stats.min_angle = f64::INFINITY;
    stats.min_edge = f64::INFINITY;
    for &[a, b, c] in &self.triangles {
      let view = TriangleView::new([&points[a], &points[b], &points[c]]);
      stats.area += view.signed_area();
      for angle in view.angles() {
        stats.min_angle = stats.min_angle.min(angle);
        stats.max_angle = stats.max_angle.max(angle);
      }
      for (src, dst) in [(a, b), (b, c), (c, a)] {
        edges
          .entry((src.min(dst), src.max(dst)))
          .or_insert_with(|| points[src].euclidean_distance(&points[dst]));
      }
    }
    for &len in edges.values() {
      stats.min_edge = stats.min_edge.min(len);
      stats.max_edge = stats.max_edge.max(len);
    }
    // Euler characteristic of a connected planar mesh: V - E + F = 1 - holes.
    stats.holes = (1 + edges.len()).saturating_sub(self.points.len() + self.triangles.len());
    stats
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::{PolygonGeometry, Pslg};

  fn export(outer: Vec<[f64; 2]>, holes: Vec<Vec<[f64; 2]>>) -> Mesh {
    let pslg = Pslg::load(&PolygonGeometry::new(outer, holes)).unwrap();
    Mesh::export(&ConstrainedTriangulation::new(&pslg).unwrap())
  }

  #[test]
  fn square_is_compacted() {
    let mesh = export(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]], vec![]);
    assert_eq!(
      mesh.points,
      vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
    );
    assert_eq!(mesh.triangles.len(), 2);
    assert_eq!(
      mesh.boundary_edges(),
      vec![[0, 1], [1, 2], [2, 3], [3, 0]]
    );
  }

  #[test]
  fn stats_of_square_with_hole() {
    let mesh = export(
      vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
      vec![vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]],
    );
    let stats = mesh.stats();
    assert_eq!(stats.points, 8);
    assert_eq!(stats.holes, 1);
    assert!((stats.area - 96.0).abs() < 1e-9);
    assert!(stats.min_angle > 0.0 && stats.max_angle < 180.0);
    assert!((stats.min_edge - 2.0).abs() < 1e-9);
    assert!(stats.max_edge >= 10.0 - 1e-9);
    assert_eq!(mesh.boundary_edges().len(), 8);
  }

  #[test]
  fn empty_mesh_stats() {
    let stats = Mesh::default().stats();
    assert_eq!(stats, MeshStats::default());
  }

  #[test]
  fn json_shape() {
    let mesh = Mesh {
      points: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
      triangles: vec![[0, 1, 2]],
    };
    let json = serde_json::to_value(&mesh).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "points": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        "triangles": [[0, 1, 2]],
      })
    );
  }
}

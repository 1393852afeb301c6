use log::debug;
use ordered_float::NotNan;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use super::{Aabb, Geometry, LineSegmentView, Point, PolygonGeometry};
use crate::Error;

/// Index of a point in a [`Pslg`] and, with the same numbering, in the
/// triangulation built from it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub usize);

impl std::fmt::Debug for PointId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
    write!(f, "p{}", self.0)
  }
}

impl From<usize> for PointId {
  fn from(idx: usize) -> PointId {
    PointId(idx)
  }
}

impl PointId {
  pub fn usize(self) -> usize {
    self.0
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RingId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RingKind {
  Outer,
  Hole(usize),
}

/// A closed ring of point indices. The closing edge from the last point back
/// to the first is implicit. Outer rings are counter-clockwise and holes are
/// clockwise, so the meshed domain is always to the left of every edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ring {
  pub kind: RingKind,
  pub vertices: Vec<PointId>,
}

impl Ring {
  pub fn len(&self) -> usize {
    self.vertices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vertices.is_empty()
  }

  /// Directed edges in ring order, including the closing edge.
  pub fn edges(&self) -> impl Iterator<Item = DirectedIndexEdge> + '_ {
    let n = self.vertices.len();
    (0..n).map(move |i| DirectedIndexEdge {
      src: self.vertices[i],
      dst: self.vertices[(i + 1) % n],
    })
  }
}

// Undirected indexed edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexEdge {
  pub min: PointId,
  pub max: PointId,
}

impl IndexEdge {
  pub fn new(a: PointId, b: PointId) -> IndexEdge {
    IndexEdge {
      min: std::cmp::min(a, b),
      max: std::cmp::max(a, b),
    }
  }
}

impl From<DirectedIndexEdge> for IndexEdge {
  fn from(directed: DirectedIndexEdge) -> IndexEdge {
    IndexEdge::new(directed.src, directed.dst)
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirectedIndexEdge {
  pub src: PointId,
  pub dst: PointId,
}

/// A boundary edge that must survive triangulation and refinement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
  pub edge: DirectedIndexEdge,
  pub ring: RingId,
}

/// Planar straight-line graph: deduplicated points plus the ring edges
/// connecting them. Read-only once loaded.
#[derive(Clone, Debug)]
pub struct Pslg {
  points: Vec<Point<f64, 2>>,
  rings: Vec<Ring>,
  constraints: Vec<Constraint>,
}

impl Pslg {
  pub fn from_geometry(geometry: &Geometry) -> Result<Pslg, Error> {
    match geometry {
      Geometry::Polygon(polygon) => Pslg::load(polygon),
    }
  }

  /// Normalize an outer ring and its holes.
  ///
  /// Closing duplicates and repeated consecutive coordinates are dropped,
  /// ring orientation is normalized (outer counter-clockwise, holes
  /// clockwise) and points shared between rings are merged.
  ///
  /// # Errors
  ///
  /// [`Error::InvalidGeometry`] when a ring has non-finite coordinates, fewer
  /// than three distinct points or zero signed area, or when a hole pokes out
  /// of the outer ring's bounding box.
  pub fn load(polygon: &PolygonGeometry) -> Result<Pslg, Error> {
    let outer = clean_ring(&polygon.outer, "outer ring")?;
    let outer_box = ring_bbox(&outer);

    let mut rings = Vec::with_capacity(polygon.ring_count());
    let mut reversed = 0;
    let mut outer = outer;
    if signed_area(&outer) < 0.0 {
      outer.reverse();
      reversed += 1;
    }
    rings.push((RingKind::Outer, outer));

    for (n, hole) in polygon.holes.iter().enumerate() {
      let what = format!("hole {}", n);
      let mut hole = clean_ring(hole, &what)?;
      if !outer_box.contains(&ring_bbox(&hole)) {
        return Err(Error::geometry(format!(
          "{} is not inside the outer ring's bounding box",
          what
        )));
      }
      if signed_area(&hole) > 0.0 {
        hole.reverse();
        reversed += 1;
      }
      rings.push((RingKind::Hole(n), hole));
    }

    let mut points = Vec::new();
    let mut lookup: BTreeMap<[NotNan<f64>; 2], PointId> = BTreeMap::new();
    let mut pslg_rings = Vec::with_capacity(rings.len());
    for (kind, coords) in rings {
      let mut vertices = Vec::with_capacity(coords.len());
      for pt in coords {
        let key = not_nan(&pt)?;
        let id = match lookup.entry(key) {
          Entry::Occupied(entry) => *entry.get(),
          Entry::Vacant(entry) => {
            let id = PointId(points.len());
            points.push(pt);
            *entry.insert(id)
          }
        };
        vertices.push(id);
      }
      pslg_rings.push(Ring { kind, vertices });
    }

    let mut seen = BTreeSet::new();
    let mut constraints = Vec::new();
    for (ring_idx, ring) in pslg_rings.iter().enumerate() {
      for edge in ring.edges() {
        if seen.insert(IndexEdge::from(edge)) {
          constraints.push(Constraint {
            edge,
            ring: RingId(ring_idx),
          });
        }
      }
    }

    debug!(
      "loaded {} points, {} rings ({} reversed), {} constraint edges",
      points.len(),
      pslg_rings.len(),
      reversed,
      constraints.len()
    );

    Ok(Pslg {
      points,
      rings: pslg_rings,
      constraints,
    })
  }

  pub fn points(&self) -> &[Point<f64, 2>] {
    &self.points
  }

  pub fn point(&self, id: PointId) -> &Point<f64, 2> {
    &self.points[id.0]
  }

  pub fn rings(&self) -> &[Ring] {
    &self.rings
  }

  pub fn ring(&self, id: RingId) -> &Ring {
    &self.rings[id.0]
  }

  pub fn outer(&self) -> &Ring {
    &self.rings[0]
  }

  pub fn holes(&self) -> &[Ring] {
    &self.rings[1..]
  }

  pub fn constraints(&self) -> &[Constraint] {
    &self.constraints
  }

  pub fn segment(&self, edge: DirectedIndexEdge) -> LineSegmentView<'_> {
    LineSegmentView::new(self.point(edge.src), self.point(edge.dst))
  }

  pub fn bounding_box(&self) -> Aabb {
    // The outer ring always holds at least three points.
    Aabb::enclosing(&self.points)
      .unwrap_or_else(|| Aabb::new(Point::new([0.0, 0.0]), Point::new([0.0, 0.0])))
  }
}

fn not_nan(pt: &Point<f64, 2>) -> Result<[NotNan<f64>; 2], Error> {
  let x = NotNan::new(pt[0]).map_err(|_| Error::geometry("NaN coordinate"))?;
  let y = NotNan::new(pt[1]).map_err(|_| Error::geometry("NaN coordinate"))?;
  Ok([x, y])
}

fn clean_ring(coords: &[[f64; 2]], what: &str) -> Result<Vec<Point<f64, 2>>, Error> {
  if let Some(bad) = coords.iter().find(|c| !c[0].is_finite() || !c[1].is_finite()) {
    return Err(Error::geometry(format!(
      "{} has a non-finite coordinate ({}, {})",
      what, bad[0], bad[1]
    )));
  }
  let mut ring: Vec<Point<f64, 2>> = Vec::with_capacity(coords.len());
  for &c in coords {
    let pt = Point::new(c);
    if ring.last() != Some(&pt) {
      ring.push(pt);
    }
  }
  // Closing duplicate and wrap-around repeats.
  while ring.len() > 1 && ring.first() == ring.last() {
    ring.pop();
  }
  if ring.len() < 3 {
    return Err(Error::geometry(format!(
      "{} has {} distinct points, at least 3 are required",
      what,
      ring.len()
    )));
  }
  if signed_area(&ring) == 0.0 {
    return Err(Error::geometry(format!("{} has zero area", what)));
  }
  Ok(ring)
}

fn ring_bbox(ring: &[Point<f64, 2>]) -> Aabb {
  Aabb::enclosing(ring).unwrap_or_else(|| Aabb::new(Point::new([0.0, 0.0]), Point::new([0.0, 0.0])))
}

// Shoelace formula. Positive for counter-clockwise rings.
fn signed_area(ring: &[Point<f64, 2>]) -> f64 {
  let n = ring.len();
  let twice: f64 = (0..n)
    .map(|i| {
      let p = &ring[i];
      let q = &ring[(i + 1) % n];
      p[0] * q[1] - q[0] * p[1]
    })
    .sum();
  twice / 2.0
}

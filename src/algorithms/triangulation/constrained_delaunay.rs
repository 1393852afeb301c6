use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeSet, VecDeque};

use super::delaunay::{Edge, SubIdx, TriIdx, TriangularNetwork, VertIdx, SUPER_VERTICES};
use crate::data::{LineSegmentView, Point, PointId, Pslg};
use crate::{Error, Orientation, EPSILON};

// Fixed so that identical input always produces identical meshes.
const INSERTION_SEED: u64 = 0x5eed_cafe;

/// Constrained Delaunay triangulation of a [`Pslg`] with holes and exterior
/// carved away.
///
/// Vertex `i` of the PSLG is [`VertIdx::from(PointId(i))`](VertIdx); later
/// vertices are Steiner points added by refinement.
#[derive(Debug, Clone)]
pub struct ConstrainedTriangulation {
  net: TriangularNetwork,
  input_points: usize,
  holes: usize,
  resolution: f64,
}

impl ConstrainedTriangulation {
  /// Triangulate the PSLG, recover every boundary edge and carve away holes
  /// and the exterior.
  ///
  /// # Errors
  ///
  /// [`Error::DegenerateConstraint`] if a boundary edge runs through another
  /// input point or cannot be recovered by flipping. [`Error::InvalidGeometry`]
  /// if two input points coincide.
  pub fn new(pslg: &Pslg) -> Result<ConstrainedTriangulation, Error> {
    let mut net = TriangularNetwork::new(&pslg.bounding_box());
    let ids: Vec<VertIdx> = pslg.points().iter().map(|p| net.add_vert(*p)).collect();

    let mut order = ids.clone();
    order.shuffle(&mut SmallRng::seed_from_u64(INSERTION_SEED));
    for v in order {
      if !net.insert_vertex(v) {
        return Err(Error::geometry(format!(
          "point {:?} could not be inserted",
          v.point_id()
        )));
      }
    }
    net.check_invariant("post-insert");

    let bbox = pslg.bounding_box();
    let magnitude = [bbox.min[0], bbox.min[1], bbox.max[0], bbox.max[1]]
      .iter()
      .fold(bbox.diagonal(), |acc, c| acc.max(c.abs()));
    let mut cdt = ConstrainedTriangulation {
      net,
      input_points: ids.len(),
      holes: pslg.holes().len(),
      resolution: EPSILON * magnitude,
    };

    let mut recovered = 0;
    for constraint in pslg.constraints() {
      let (u, v) = (
        VertIdx::from(constraint.edge.src),
        VertIdx::from(constraint.edge.dst),
      );
      if cdt.recover_edge(u, v)? {
        recovered += 1;
      }
    }
    cdt.net.check_invariant("post-recover");
    debug!(
      "recovered {} of {} constraint edges by flipping",
      recovered,
      pslg.constraints().len()
    );

    let carved = cdt.carve(pslg);
    cdt.net.check_invariant("post-carve");
    debug!(
      "carved {} triangles, {} remain",
      carved,
      cdt.net.live_triangles().count()
    );
    cdt.net.take_touched();
    Ok(cdt)
  }

  pub fn network(&self) -> &TriangularNetwork {
    &self.net
  }

  pub(crate) fn network_mut(&mut self) -> &mut TriangularNetwork {
    &mut self.net
  }

  /// All vertices, including the three super-triangle vertices at the front.
  pub fn points(&self) -> &[Point<f64>] {
    &self.net.vertices
  }

  /// Number of points that came from the PSLG.
  pub fn input_points(&self) -> usize {
    self.input_points
  }

  pub fn is_input_vertex(&self, v: VertIdx) -> bool {
    !v.is_super() && v.0 < SUPER_VERTICES + self.input_points
  }

  pub fn hole_count(&self) -> usize {
    self.holes
  }

  /// Smallest distance allowed between a new Steiner point and an existing
  /// vertex. Scales with the size and offset of the input.
  pub fn resolution(&self) -> f64 {
    self.resolution
  }

  /// Vertices of every remaining triangle, counter-clockwise.
  pub fn live_triangles(&self) -> impl Iterator<Item = [VertIdx; 3]> + '_ {
    self
      .net
      .live_triangles()
      .map(move |t| self.net.tri(t).vertices)
  }

  /// Constrained edges of the remaining triangles. Boundary edges that were
  /// split by refinement show up as their pieces.
  pub fn constraint_edges(&self) -> BTreeSet<(VertIdx, VertIdx)> {
    let mut out = BTreeSet::new();
    for t in self.net.live_triangles() {
      for sub in (0..3).map(SubIdx) {
        let e = Edge::new(t, sub);
        if self.net.is_constrained(e) {
          let (a, b) = self.net.endpoints(e);
          out.insert((a.min(b), a.max(b)));
        }
      }
    }
    out
  }

  // Returns true if flips were needed.
  fn recover_edge(&mut self, u: VertIdx, v: VertIdx) -> Result<bool, Error> {
    let degenerate = || Error::DegenerateConstraint {
      from: u.point_id().unwrap_or(PointId(0)),
      to: v.point_id().unwrap_or(PointId(0)),
    };

    if self.net.find_edge(u, v).is_some() {
      self.net.mark_constrained(u, v);
      return Ok(false);
    }

    let crossing = self.crossing_edges(u, v).ok_or_else(degenerate)?;
    self.net.take_touched();
    let k = crossing.len();
    let budget = 4 * (k + 1) * (k + 1);
    let mut queue: VecDeque<(VertIdx, VertIdx)> = crossing.into();
    let mut fresh = Vec::new();
    let mut attempts = 0;

    while let Some((x, y)) = queue.pop_front() {
      attempts += 1;
      if attempts > budget {
        return Err(degenerate());
      }
      let edge = match self.net.find_edge(x, y) {
        Some(e) => e,
        None => continue,
      };
      if self.net.is_constrained(edge) {
        // Two boundary edges cross.
        return Err(degenerate());
      }
      if !self.net.is_flippable(edge) {
        queue.push_back((x, y));
        continue;
      }
      let (t0, _) = self.net.flip(edge).ok_or_else(degenerate)?;
      let [a, _, d] = self.net.tri(t0).vertices;
      let seg = LineSegmentView::new(self.net.vert(u), self.net.vert(v));
      let diagonal = LineSegmentView::new(self.net.vert(a), self.net.vert(d));
      if seg.crosses(&diagonal) {
        queue.push_back((a, d));
      } else {
        fresh.push((a, d));
      }
    }

    if !self.net.mark_constrained(u, v) {
      return Err(degenerate());
    }
    // Re-check the new diagonals and the rim of the flipped region.
    let rim = self.net.take_touched().into_iter().flat_map(|t| {
      let [a, b, c] = self.net.tri(t).vertices;
      [(a, b), (b, c), (c, a)]
    });
    fresh.extend(rim);
    fresh.retain(|&(a, d)| !((a == u && d == v) || (a == v && d == u)));
    self.net.legalize_edges(fresh);
    Ok(true)
  }

  // Edges crossed by the open segment `u-v`, as (right, left) endpoint pairs
  // in order from `u` to `v`. `None` if the segment runs through a vertex.
  fn crossing_edges(&self, u: VertIdx, v: VertIdx) -> Option<Vec<(VertIdx, VertIdx)>> {
    let net = &self.net;
    let (pu, pv) = (net.vert(u), net.vert(v));
    let seg = LineSegmentView::new(pu, pv);

    let mut entry = None;
    for t in net.triangles_around(u) {
      let tri = net.tri(t);
      let k = tri.vertex_idx(u)?;
      let (b, c) = (tri.vert(k.ccw()), tri.vert(k.cw()));
      if b == v || c == v {
        return Some(Vec::new());
      }
      if seg.contains_interior(net.vert(b)) || seg.contains_interior(net.vert(c)) {
        return None;
      }
      if Orientation::new(pu, pv, net.vert(b)).is_cw() && Orientation::new(pu, pv, net.vert(c)).is_ccw()
      {
        entry = Some((t, b, c));
        break;
      }
    }

    let (mut cur, mut right, mut left) = entry?;
    let mut out = vec![(right, left)];
    for _ in 0..net.triangles.len() {
      let tri = net.tri(cur);
      let sub = tri
        .vertices
        .iter()
        .position(|&w| w != right && w != left)
        .map(SubIdx)?;
      let next = tri.neighbor(sub)?;
      let n = net.tri(next);
      let apex = n
        .vertices
        .into_iter()
        .find(|&w| w != right && w != left)?;
      if apex == v {
        return Some(out);
      }
      match Orientation::new(pu, pv, net.vert(apex)) {
        Orientation::CoLinear => return None,
        Orientation::CounterClockWise => left = apex,
        Orientation::ClockWise => right = apex,
      }
      out.push((right, left));
      cur = next;
    }
    None
  }

  // Flood fill from the right-hand side of every ring edge and from the
  // super-triangle, never crossing a constrained edge.
  fn carve(&mut self, pslg: &Pslg) -> usize {
    let net = &self.net;
    let mut dead = vec![false; net.triangles.len()];
    let mut stack: Vec<TriIdx> = net
      .live_triangles()
      .filter(|&t| net.tri(t).is_super())
      .collect();
    for ring in pslg.rings() {
      for edge in ring.edges() {
        let (a, b) = (VertIdx::from(edge.src), VertIdx::from(edge.dst));
        if let Some(e) = net.directed_edge(b, a) {
          stack.push(e.tri);
        }
      }
    }
    while let Some(t) = stack.pop() {
      if dead[t.0] {
        continue;
      }
      dead[t.0] = true;
      let tri = net.tri(t);
      for sub in (0..3).map(SubIdx) {
        if tri.is_constrained(sub) {
          continue;
        }
        if let Some(n) = tri.neighbor(sub) {
          if !dead[n.0] {
            stack.push(n);
          }
        }
      }
    }
    self.net.remove_triangles(&dead)
  }
}

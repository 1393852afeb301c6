// https://www.personal.psu.edu/cxc11/AERSP560/DELAUNEY/13_Two_algorithms_Delauney.pdf
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::data::{Aabb, LineSegmentView, Point, PointId, TriangleView};
use crate::{in_circle, Orientation};

/// Number of super-triangle vertices at the front of the vertex list.
pub const SUPER_VERTICES: usize = 3;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct TriIdx(pub usize);
impl std::fmt::Debug for TriIdx {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "t{}", self.0)
  }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct VertIdx(pub usize);
impl std::fmt::Debug for VertIdx {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "v{}", self.0)
  }
}

impl VertIdx {
  pub fn is_super(&self) -> bool {
    self.0 < SUPER_VERTICES
  }

  pub fn point_id(self) -> Option<PointId> {
    self.0.checked_sub(SUPER_VERTICES).map(PointId)
  }
}

impl From<PointId> for VertIdx {
  fn from(id: PointId) -> VertIdx {
    VertIdx(id.0 + SUPER_VERTICES)
  }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct SubIdx(pub usize);
impl std::fmt::Debug for SubIdx {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "s{}", self.0)
  }
}

impl SubIdx {
  pub fn ccw(self) -> Self {
    Self((self.0 + 1) % 3)
  }
  pub fn cw(self) -> Self {
    Self((self.0 + 2) % 3)
  }
}

/// The edge of `tri` opposite to vertex `sub`, running from `sub.ccw()` to
/// `sub.cw()`. The triangle lies to the left of that direction.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub struct Edge {
  pub tri: TriIdx,
  pub sub: SubIdx,
}

impl Edge {
  pub fn new(tri: TriIdx, sub: SubIdx) -> Self {
    Self { tri, sub }
  }
}

/// A location of a point, in `TriangularNetwork`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Location {
  /// The point is strictly inside the triangle
  InTriangle(TriIdx),
  /// The point lies in the interior of an edge
  OnEdge(Edge),
  /// The point coincides with an existing vertex
  OnVertex(VertIdx),
  /// The point is beyond a boundary edge of the network
  Outside(Edge),
}

/// Result of walking a straight line through the network.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Walk {
  Reached(Location),
  /// The line crosses a constrained (or boundary) edge.
  Blocked(Edge),
}

/// Triangle representation
#[derive(Clone)]
pub struct Triangle {
  /// list of vertex indices, in counterclockwise order
  pub vertices: [VertIdx; 3],
  /// `neighbors[i]` shares the edge opposite to `vertices[i]`
  pub neighbors: [Option<TriIdx>; 3],
  /// `constrained[i]` marks the edge opposite to `vertices[i]`
  pub constrained: [bool; 3],
  pub alive: bool,
}

impl std::fmt::Debug for Triangle {
  fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(fmt, "Tri{{v=(")?;
    for (idx, v) in self.vertices.iter().enumerate() {
      let prefix = if idx == 0 { "" } else { ", " };
      write!(fmt, "{}{}", prefix, v.0)?;
    }
    write!(fmt, "), n=(")?;
    for (idx, n) in self.neighbors.iter().enumerate() {
      let prefix = if idx == 0 { "" } else { ", " };
      let mark = if self.constrained[idx] { "#" } else { "" };
      match n {
        Some(idx) => write!(fmt, "{}{}{}", prefix, idx.0, mark)?,
        None => write!(fmt, "{}_{}", prefix, mark)?,
      }
    }
    if !self.alive {
      write!(fmt, ") dead}}")
    } else {
      write!(fmt, ")}}")
    }
  }
}

impl Triangle {
  fn new(vertices: [VertIdx; 3], neighbors: [Option<TriIdx>; 3], constrained: [bool; 3]) -> Self {
    Triangle {
      vertices,
      neighbors,
      constrained,
      alive: true,
    }
  }

  /// Returns true if a triangle is part of supertriangle.
  pub fn is_super(&self) -> bool {
    self.vertices.iter().any(VertIdx::is_super)
  }

  pub fn vert(&self, idx: SubIdx) -> VertIdx {
    self.vertices[idx.0]
  }

  pub fn neighbor(&self, idx: SubIdx) -> Option<TriIdx> {
    self.neighbors[idx.0]
  }

  pub fn is_constrained(&self, idx: SubIdx) -> bool {
    self.constrained[idx.0]
  }

  fn update_neighbor(&mut self, idx_from: TriIdx, idx_to: TriIdx) -> bool {
    for n in self.neighbors.iter_mut() {
      if *n == Some(idx_from) {
        *n = Some(idx_to);
        return true;
      }
    }
    false
  }

  pub fn vertex_idx(&self, v_idx: VertIdx) -> Option<SubIdx> {
    self.vertices.iter().position(|p| *p == v_idx).map(SubIdx)
  }

  /// Index of the vertex that is neither `a` nor `b`.
  fn third(&self, a: VertIdx, b: VertIdx) -> Option<SubIdx> {
    self
      .vertices
      .iter()
      .position(|p| *p != a && *p != b)
      .map(SubIdx)
  }
}

/// Mutable triangulation with adjacency, enclosed by a super-triangle.
///
/// Triangle slots are rewritten in place by splits and flips; carved
/// triangles stay in the list with `alive == false`.
#[derive(Debug, Clone)]
pub struct TriangularNetwork {
  pub vertices: Vec<Point<f64>>,
  pub triangles: Vec<Triangle>,
  vert_tri: Vec<Option<TriIdx>>,
  hint: TriIdx,
  touched: Vec<TriIdx>,
}

impl TriangularNetwork {
  /// Create a network holding a single super-triangle that comfortably
  /// encloses `bbox`.
  pub fn new(bbox: &Aabb) -> Self {
    let cx = bbox.center(0);
    let cy = bbox.center(1);
    let m = bbox.extent(0).max(bbox.extent(1));
    let m = if m > 0.0 { m } else { 1.0 };
    let vertices = vec![
      Point::new([cx - 20.0 * m, cy - 10.0 * m]),
      Point::new([cx + 20.0 * m, cy - 10.0 * m]),
      Point::new([cx, cy + 20.0 * m]),
    ];
    let t0 = TriIdx(0);
    TriangularNetwork {
      vertices,
      triangles: vec![Triangle::new(
        [VertIdx(0), VertIdx(1), VertIdx(2)],
        [None; 3],
        [false; 3],
      )],
      vert_tri: vec![Some(t0); SUPER_VERTICES],
      hint: t0,
      touched: vec![t0],
    }
  }

  pub fn tri(&self, idx: TriIdx) -> &Triangle {
    &self.triangles[idx.0]
  }

  fn tri_mut(&mut self, idx: TriIdx) -> &mut Triangle {
    &mut self.triangles[idx.0]
  }

  fn set_tri(&mut self, idx: TriIdx, t: Triangle) {
    for v in t.vertices {
      self.vert_tri[v.0] = Some(idx);
    }
    self.triangles[idx.0] = t;
    self.touched.push(idx);
  }

  fn add_tri(&mut self, t: Triangle) -> TriIdx {
    let idx = TriIdx(self.triangles.len());
    for v in t.vertices {
      self.vert_tri[v.0] = Some(idx);
    }
    self.triangles.push(t);
    self.touched.push(idx);
    idx
  }

  pub fn vert(&self, idx: VertIdx) -> &Point<f64> {
    &self.vertices[idx.0]
  }

  /// Append a vertex without linking it into the triangulation.
  pub fn add_vert(&mut self, p: Point<f64>) -> VertIdx {
    let idx = self.vertices.len();
    self.vertices.push(p);
    self.vert_tri.push(None);
    VertIdx(idx)
  }

  pub fn tri_vert(&self, tri_idx: TriIdx, idx: SubIdx) -> &Point<f64> {
    self.vert(self.tri(tri_idx).vertices[idx.0])
  }

  pub fn view(&self, idx: TriIdx) -> TriangleView<'_> {
    let [a, b, c] = self.tri(idx).vertices;
    TriangleView::new([self.vert(a), self.vert(b), self.vert(c)])
  }

  pub fn live_triangles(&self) -> impl Iterator<Item = TriIdx> + '_ {
    self
      .triangles
      .iter()
      .enumerate()
      .filter(|(_, t)| t.alive)
      .map(|(idx, _)| TriIdx(idx))
  }

  /// Drain the list of triangle slots written since the last call.
  pub fn take_touched(&mut self) -> Vec<TriIdx> {
    std::mem::take(&mut self.touched)
  }

  pub fn endpoints(&self, edge: Edge) -> (VertIdx, VertIdx) {
    let t = self.tri(edge.tri);
    (t.vert(edge.sub.ccw()), t.vert(edge.sub.cw()))
  }

  pub fn segment(&self, edge: Edge) -> LineSegmentView<'_> {
    let (a, b) = self.endpoints(edge);
    LineSegmentView::new(self.vert(a), self.vert(b))
  }

  pub fn apex(&self, edge: Edge) -> VertIdx {
    self.tri(edge.tri).vert(edge.sub)
  }

  pub fn is_constrained(&self, edge: Edge) -> bool {
    self.tri(edge.tri).is_constrained(edge.sub)
  }

  /// The same edge seen from the neighboring triangle.
  pub fn edge_duel(&self, edge: &Edge) -> Option<Edge> {
    let idx_neighbor = self.tri(edge.tri).neighbor(edge.sub)?;
    let (a, b) = self.endpoints(*edge);
    let sub = self.tri(idx_neighbor).third(a, b)?;
    Some(Edge::new(idx_neighbor, sub))
  }

  /// Triangles incident to `v`. Works for interior and boundary vertices.
  pub fn triangles_around(&self, v: VertIdx) -> Vec<TriIdx> {
    let start = match self.vert_tri.get(v.0).copied().flatten() {
      Some(t) if self.tri(t).alive && self.tri(t).vertex_idx(v).is_some() => t,
      _ => match self
        .live_triangles()
        .find(|&t| self.tri(t).vertex_idx(v).is_some())
      {
        Some(t) => t,
        None => return Vec::new(),
      },
    };
    let limit = self.triangles.len();
    let mut out = vec![start];
    let mut cur = start;
    for _ in 0..limit {
      let t = self.tri(cur);
      let k = match t.vertex_idx(v) {
        Some(k) => k,
        None => return out,
      };
      match t.neighbor(k.ccw()) {
        Some(n) if n == start => return out,
        Some(n) => {
          out.push(n);
          cur = n;
        }
        None => break,
      }
    }
    // Open fan: also rotate clockwise from the start.
    let mut cur = start;
    for _ in 0..limit {
      let t = self.tri(cur);
      let k = match t.vertex_idx(v) {
        Some(k) => k,
        None => break,
      };
      match t.neighbor(k.cw()) {
        Some(n) if !out.contains(&n) => {
          out.push(n);
          cur = n;
        }
        _ => break,
      }
    }
    out
  }

  /// The edge running from `u` to `v`, seen from the triangle on its left.
  pub fn directed_edge(&self, u: VertIdx, v: VertIdx) -> Option<Edge> {
    self.triangles_around(u).into_iter().find_map(|t| {
      let k = self.tri(t).vertex_idx(u)?;
      if self.tri(t).vert(k.ccw()) == v {
        Some(Edge::new(t, k.cw()))
      } else {
        None
      }
    })
  }

  pub fn find_edge(&self, u: VertIdx, v: VertIdx) -> Option<Edge> {
    self
      .directed_edge(u, v)
      .or_else(|| self.directed_edge(v, u))
  }

  /// Mark the edge between `u` and `v` as constrained on both sides.
  pub fn mark_constrained(&mut self, u: VertIdx, v: VertIdx) -> bool {
    let sides = [self.directed_edge(u, v), self.directed_edge(v, u)];
    let mut found = false;
    for e in sides.into_iter().flatten() {
      self.tri_mut(e.tri).constrained[e.sub.0] = true;
      found = true;
    }
    found
  }

  // Location of `p` relative to a single triangle, `None` if outside.
  fn classify(&self, idx: TriIdx, p: &Point<f64>) -> Option<Location> {
    let t = self.tri(idx);
    if let Some(&v) = t.vertices.iter().find(|&&v| self.vert(v) == p) {
      return Some(Location::OnVertex(v));
    }
    let mut on_edge = None;
    for i in 0..3 {
      let i = SubIdx(i);
      let b = self.vert(t.vert(i.ccw()));
      let c = self.vert(t.vert(i.cw()));
      match Orientation::new(b, c, p) {
        Orientation::ClockWise => return None,
        Orientation::CoLinear => on_edge = Some(i),
        Orientation::CounterClockWise => (),
      }
    }
    Some(match on_edge {
      Some(i) => Location::OnEdge(Edge::new(idx, i)),
      None => Location::InTriangle(idx),
    })
  }

  /// Visibility walk from the last touched triangle. Falls back to a linear
  /// scan if the walk does not settle.
  pub fn locate(&self, p: &Point<f64>) -> Location {
    let mut cur = if self.tri(self.hint).alive {
      self.hint
    } else {
      match self.live_triangles().next() {
        Some(t) => t,
        None => return Location::Outside(Edge::new(self.hint, SubIdx(0))),
      }
    };

    let limit = self.triangles.len() + 16;
    'walk: for step in 0..limit {
      let t = self.tri(cur);
      for k in 0..3 {
        // Rotating the first edge tested keeps the walk from cycling.
        let i = SubIdx((k + step) % 3);
        let b = self.vert(t.vert(i.ccw()));
        let c = self.vert(t.vert(i.cw()));
        if Orientation::new(b, c, p).is_cw() {
          match t.neighbor(i) {
            Some(n) => {
              cur = n;
              continue 'walk;
            }
            None => return Location::Outside(Edge::new(cur, i)),
          }
        }
      }
      if let Some(loc) = self.classify(cur, p) {
        return loc;
      }
    }
    self.locate_by_scan(p)
  }

  fn locate_by_scan(&self, p: &Point<f64>) -> Location {
    self
      .live_triangles()
      .find_map(|t| self.classify(t, p))
      .unwrap_or(Location::Outside(Edge::new(self.hint, SubIdx(0))))
  }

  /// Walk the straight line from `from` (inside `start`) towards `to`.
  /// Returns `None` if the line runs exactly through vertices in a way the
  /// walk cannot resolve.
  pub fn walk(&self, start: TriIdx, from: &Point<f64>, to: &Point<f64>) -> Option<Walk> {
    let mut cur = start;
    for _ in 0..self.triangles.len() + 16 {
      if let Some(loc) = self.classify(cur, to) {
        return Some(Walk::Reached(loc));
      }
      let t = self.tri(cur);
      let exit = (0..3).map(SubIdx).find(|&i| {
        let b = self.vert(t.vert(i.ccw()));
        let c = self.vert(t.vert(i.cw()));
        Orientation::new(b, c, to).is_cw()
          && !Orientation::new(from, to, b).is_ccw()
          && !Orientation::new(from, to, c).is_cw()
      })?;
      if t.is_constrained(exit) {
        return Some(Walk::Blocked(Edge::new(cur, exit)));
      }
      match t.neighbor(exit) {
        Some(n) => cur = n,
        None => return Some(Walk::Blocked(Edge::new(cur, exit))),
      }
    }
    None
  }

  /// Add a new point to the network. Returns `None` if the point already
  /// exists or lies outside the network.
  pub fn insert(&mut self, p: Point<f64>) -> Option<VertIdx> {
    match self.locate(&p) {
      Location::OnVertex(_) | Location::Outside(_) => None,
      loc => {
        let v = self.add_vert(p);
        self.insert_at(v, loc);
        Some(v)
      }
    }
  }

  /// Link a vertex previously added with [`add_vert`](Self::add_vert).
  /// Returns false if it coincides with a linked vertex or lies outside.
  pub fn insert_vertex(&mut self, v: VertIdx) -> bool {
    let p = *self.vert(v);
    match self.locate(&p) {
      Location::OnVertex(_) | Location::Outside(_) => false,
      loc => {
        self.insert_at(v, loc);
        true
      }
    }
  }

  /// Split the triangle or edge found at `loc` with vertex `v`, then restore
  /// the Delaunay property around `v`. Constrained edges are split into
  /// constrained halves and never flipped.
  pub fn insert_at(&mut self, v: VertIdx, loc: Location) {
    let created = match loc {
      Location::InTriangle(t) => self.split_triangle(t, v).to_vec(),
      Location::OnEdge(e) => self.split_edge(e, v),
      Location::OnVertex(_) | Location::Outside(_) => return,
    };
    for &t in &created {
      self.check_invariant_tri(t, "post-split");
    }
    self.legalize_around(v, created);
  }

  fn split_triangle(&mut self, idx: TriIdx, p: VertIdx) -> [TriIdx; 3] {
    let t = self.tri(idx).clone();
    let [a, b, c] = t.vertices;
    let [na, nb, nc] = t.neighbors;
    let [fa, fb, fc] = t.constrained;

    let idx_t0 = idx;
    let idx_t1 = TriIdx(self.triangles.len());
    let idx_t2 = TriIdx(self.triangles.len() + 1);

    self.set_tri(
      idx_t0,
      Triangle::new([a, b, p], [Some(idx_t1), Some(idx_t2), nc], [false, false, fc]),
    );
    let t1 = self.add_tri(Triangle::new(
      [b, c, p],
      [Some(idx_t2), Some(idx_t0), na],
      [false, false, fa],
    ));
    let t2 = self.add_tri(Triangle::new(
      [c, a, p],
      [Some(idx_t0), Some(idx_t1), nb],
      [false, false, fb],
    ));
    debug_assert_eq!((t1, t2), (idx_t1, idx_t2));

    if let Some(n) = na {
      self.tri_mut(n).update_neighbor(idx, idx_t1);
    }
    if let Some(n) = nb {
      self.tri_mut(n).update_neighbor(idx, idx_t2);
    }
    self.hint = idx_t0;
    [idx_t0, idx_t1, idx_t2]
  }

  //          a
  //        t0 t1
  //     b -- m -- c
  //        n1 n0
  //          d
  fn split_edge(&mut self, edge: Edge, m: VertIdx) -> Vec<TriIdx> {
    let idx_t = edge.tri;
    let t = self.tri(idx_t).clone();
    let i = edge.sub;
    let (a, b, c) = (t.vert(i), t.vert(i.ccw()), t.vert(i.cw()));
    let f_bc = t.is_constrained(i);
    let (n_ca, f_ca) = (t.neighbor(i.ccw()), t.is_constrained(i.ccw()));
    let (n_ab, f_ab) = (t.neighbor(i.cw()), t.is_constrained(i.cw()));

    let dual = self.edge_duel(&edge);
    let idx_t1 = TriIdx(self.triangles.len());
    let idx_n1 = dual.map(|_| TriIdx(self.triangles.len() + 1));
    let idx_n0 = dual.map(|e| e.tri);

    self.set_tri(
      idx_t,
      Triangle::new([a, b, m], [idx_n1, Some(idx_t1), n_ab], [f_bc, false, f_ab]),
    );
    self.add_tri(Triangle::new(
      [a, m, c],
      [idx_n0, n_ca, Some(idx_t)],
      [f_bc, f_ca, false],
    ));
    if let Some(n) = n_ca {
      self.tri_mut(n).update_neighbor(idx_t, idx_t1);
    }

    let mut created = vec![idx_t, idx_t1];
    if let (Some(dual), Some(idx_n1)) = (dual, idx_n1) {
      let idx_n = dual.tri;
      let n = self.tri(idx_n).clone();
      let j = dual.sub;
      let d = n.vert(j);
      let (n_bd, f_bd) = (n.neighbor(j.ccw()), n.is_constrained(j.ccw()));
      let (n_dc, f_dc) = (n.neighbor(j.cw()), n.is_constrained(j.cw()));

      self.set_tri(
        idx_n,
        Triangle::new([d, c, m], [Some(idx_t1), Some(idx_n1), n_dc], [f_bc, false, f_dc]),
      );
      let added = self.add_tri(Triangle::new(
        [d, m, b],
        [Some(idx_t), n_bd, Some(idx_n)],
        [f_bc, f_bd, false],
      ));
      debug_assert_eq!(added, idx_n1);
      if let Some(nb) = n_bd {
        self.tri_mut(nb).update_neighbor(idx_n, idx_n1);
      }
      created.push(idx_n);
      created.push(idx_n1);
    }
    self.hint = idx_t;
    created
  }

  /// True if the edge can be flipped: it has a neighbor and the quad formed
  /// by the two triangles is strictly convex.
  pub fn is_flippable(&self, edge: Edge) -> bool {
    let dual = match self.edge_duel(&edge) {
      Some(d) => d,
      None => return false,
    };
    let t = self.tri(edge.tri);
    let a = self.vert(t.vert(edge.sub));
    let b = self.vert(t.vert(edge.sub.ccw()));
    let c = self.vert(t.vert(edge.sub.cw()));
    let d = self.vert(self.apex(dual));
    Orientation::new(a, b, d).is_ccw() && Orientation::new(d, c, a).is_ccw()
  }

  /// Delaunay test for a non-constrained edge. Cocircular quads keep the
  /// diagonal that avoids the lowest-indexed of the four vertices.
  pub fn should_flip(&self, edge: Edge) -> bool {
    let t = self.tri(edge.tri);
    if t.is_constrained(edge.sub) || !self.is_flippable(edge) {
      return false;
    }
    let dual = match self.edge_duel(&edge) {
      Some(d) => d,
      None => return false,
    };
    let (va, vb, vc) = (t.vert(edge.sub), t.vert(edge.sub.ccw()), t.vert(edge.sub.cw()));
    let vd = self.apex(dual);
    match in_circle(self.vert(va), self.vert(vb), self.vert(vc), self.vert(vd)) {
      Ordering::Greater => true,
      Ordering::Less => false,
      Ordering::Equal => {
        let lowest = va.min(vb).min(vc).min(vd);
        lowest == vb || lowest == vc
      }
    }
  }

  //      a               a
  //    /   \           / | \
  //   b --- c   =>    b  |  c
  //    \   /           \ | /
  //      d               d
  /// Replace the diagonal `b-c` by `a-d`. Returns the rewritten triangles
  /// `[a, b, d]` and `[d, c, a]`, or `None` if the edge has no neighbor.
  pub fn flip(&mut self, edge: Edge) -> Option<(TriIdx, TriIdx)> {
    let dual = self.edge_duel(&edge)?;
    let (idx_t, idx_n) = (edge.tri, dual.tri);
    let t = self.tri(idx_t).clone();
    let n = self.tri(idx_n).clone();
    let (i, j) = (edge.sub, dual.sub);

    let (a, b, c) = (t.vert(i), t.vert(i.ccw()), t.vert(i.cw()));
    let d = n.vert(j);
    let n_ca = t.neighbor(i.ccw());
    let n_ab = t.neighbor(i.cw());
    let n_bd = n.neighbor(j.ccw());
    let n_dc = n.neighbor(j.cw());

    self.set_tri(
      idx_t,
      Triangle::new(
        [a, b, d],
        [n_bd, Some(idx_n), n_ab],
        [n.is_constrained(j.ccw()), false, t.is_constrained(i.cw())],
      ),
    );
    self.set_tri(
      idx_n,
      Triangle::new(
        [d, c, a],
        [n_ca, Some(idx_t), n_dc],
        [t.is_constrained(i.ccw()), false, n.is_constrained(j.cw())],
      ),
    );
    if let Some(idx) = n_ca {
      self.tri_mut(idx).update_neighbor(idx_t, idx_n);
    }
    if let Some(idx) = n_bd {
      self.tri_mut(idx).update_neighbor(idx_n, idx_t);
    }
    self.check_invariant_tri(idx_t, "post-flip t");
    self.check_invariant_tri(idx_n, "post-flip n");
    Some((idx_t, idx_n))
  }

  // Lawson flips for the star of a freshly inserted vertex `p`. Every
  // triangle in `stack` has `p` as a vertex.
  fn legalize_around(&mut self, p: VertIdx, mut stack: Vec<TriIdx>) {
    while let Some(idx) = stack.pop() {
      let k = match self.tri(idx).vertex_idx(p) {
        Some(k) => k,
        None => continue,
      };
      let edge = Edge::new(idx, k);
      if self.should_flip(edge) {
        if let Some((t0, t1)) = self.flip(edge) {
          stack.push(t0);
          stack.push(t1);
        }
      }
    }
  }

  /// Lawson flips seeded by arbitrary edges, given by their endpoints.
  pub fn legalize_edges(&mut self, edges: Vec<(VertIdx, VertIdx)>) {
    let mut stack = edges;
    let mut budget = 64 * (self.triangles.len() + stack.len());
    while let Some((u, v)) = stack.pop() {
      if budget == 0 {
        log::warn!("legalization budget exhausted");
        return;
      }
      budget -= 1;
      let edge = match self.find_edge(u, v) {
        Some(e) => e,
        None => continue,
      };
      if self.should_flip(edge) {
        if let Some((t0, t1)) = self.flip(edge) {
          let [a, b, d] = self.tri(t0).vertices;
          let c = self.tri(t1).vert(SubIdx(1));
          stack.extend([(a, b), (b, d), (d, c), (c, a)]);
        }
      }
    }
  }

  /// Triangles whose circumcircle strictly contains `p`, grown from the
  /// triangle(s) at `loc` without crossing constrained edges, together with
  /// the constrained edges bounding that region.
  pub fn cavity(&self, loc: Location, p: &Point<f64>) -> (Vec<TriIdx>, Vec<Edge>) {
    let seed = match loc {
      Location::InTriangle(t) => t,
      Location::OnEdge(e) | Location::Outside(e) => e.tri,
      Location::OnVertex(_) => return (Vec::new(), Vec::new()),
    };
    let mut seen = HashSet::new();
    seen.insert(seed);
    let mut stack = vec![seed];
    let mut region = Vec::new();
    let mut walls = Vec::new();
    while let Some(idx) = stack.pop() {
      region.push(idx);
      let t = self.tri(idx);
      for i in (0..3).map(SubIdx) {
        if t.is_constrained(i) {
          walls.push(Edge::new(idx, i));
          continue;
        }
        if let Some(n) = t.neighbor(i) {
          if seen.contains(&n) {
            continue;
          }
          let [a, b, c] = self.tri(n).vertices;
          if in_circle(self.vert(a), self.vert(b), self.vert(c), p) == Ordering::Greater {
            seen.insert(n);
            stack.push(n);
          }
        }
      }
    }
    (region, walls)
  }

  /// Mark triangles as dead and cut every adjacency to them.
  pub fn remove_triangles(&mut self, dead: &[bool]) -> usize {
    let mut removed = 0;
    for (idx, &is_dead) in dead.iter().enumerate() {
      if is_dead && self.triangles[idx].alive {
        self.triangles[idx].alive = false;
        self.triangles[idx].neighbors = [None; 3];
        removed += 1;
      }
    }
    for t in self.triangles.iter_mut().filter(|t| t.alive) {
      for n in t.neighbors.iter_mut() {
        if matches!(n, Some(idx) if dead.get(idx.0).copied().unwrap_or(false)) {
          *n = None;
        }
      }
    }
    self.vert_tri.iter_mut().for_each(|h| *h = None);
    for idx in 0..self.triangles.len() {
      if self.triangles[idx].alive {
        for v in self.triangles[idx].vertices {
          self.vert_tri[v.0] = Some(TriIdx(idx));
        }
        self.hint = TriIdx(idx);
      }
    }
    removed
  }

  #[allow(unused)]
  #[cfg(not(debug_assertions))]
  fn check_invariant_tri(&self, _idx: TriIdx, _msg: &str) {}

  #[cfg(debug_assertions)]
  fn check_invariant_tri(&self, idx: TriIdx, msg: &str) {
    let t = self.tri(idx);
    if !t.alive {
      return;
    }
    for i in (0..3).map(SubIdx) {
      let e = Edge::new(idx, i);
      if let Some(d) = self.edge_duel(&e) {
        let n = self.tri(d.tri);
        let violated = !n.alive
          || n.neighbor(d.sub) != Some(idx)
          || self.endpoints(d) != (t.vert(i.cw()), t.vert(i.ccw()))
          || n.is_constrained(d.sub) != t.is_constrained(i);
        if violated {
          panic!(
            "invariant violated: {}, {:?}={:?}, {:?}={:?}",
            msg, idx, t, d.tri, n
          );
        }
      } else if t.neighbor(i).is_some() {
        panic!("invariant violated: {}, {:?}={:?}", msg, idx, t);
      }
    }
  }

  #[allow(unused)]
  #[cfg(not(debug_assertions))]
  pub fn check_invariant(&self, _msg: &str) {}

  /// Neighbor symmetry and winding of every live triangle. Debug builds only.
  #[cfg(debug_assertions)]
  pub fn check_invariant(&self, msg: &str) {
    for idx in self.live_triangles() {
      self.check_invariant_tri(idx, msg);
      assert!(
        self.view(idx).orientation().is_ccw(),
        "{}: {:?}={:?} is not counter-clockwise",
        msg,
        idx,
        self.tri(idx)
      );
    }
  }
}

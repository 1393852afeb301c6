use crate::data::{Aabb, LineSegment, Point};

/// Bounding-volume tree over line segments, built by recursive median split
/// along the longest axis.
#[derive(Debug, Clone)]
pub enum SegmentTree {
  Leaf {
    aabb: Aabb,
    segment: LineSegment,
  },
  Node {
    aabb: Aabb,
    left: Box<SegmentTree>,
    right: Box<SegmentTree>,
    len: usize,
  },
}

impl SegmentTree {
  /// `None` for an empty segment list.
  pub fn build(segments: Vec<LineSegment>) -> Option<SegmentTree> {
    if segments.is_empty() {
      return None;
    }
    Some(Self::build_binary_tree(segments))
  }

  fn build_binary_tree(mut items: Vec<LineSegment>) -> SegmentTree {
    if items.len() == 1 {
      let segment = items[0];
      return SegmentTree::Leaf {
        aabb: segment.as_ref().aabb(),
        segment,
      };
    }

    let bbox = items
      .iter()
      .map(|s| s.as_ref().aabb())
      .reduce(|a, b| a.union(&b))
      .unwrap_or_else(|| items[0].as_ref().aabb());
    let axis = bbox.longest_axis();
    let key = |s: &LineSegment| s.src[axis] + s.dst[axis];
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));

    let mid = items.len() / 2;
    let right_items = items.split_off(mid);
    let left = Box::new(Self::build_binary_tree(items));
    let right = Box::new(Self::build_binary_tree(right_items));
    SegmentTree::Node {
      aabb: left.aabb().union(right.aabb()),
      len: left.len() + right.len(),
      left,
      right,
    }
  }

  pub fn aabb(&self) -> &Aabb {
    match self {
      SegmentTree::Leaf { aabb, .. } => aabb,
      SegmentTree::Node { aabb, .. } => aabb,
    }
  }

  /// Number of segments. Never zero: [`build`](Self::build) returns `None`
  /// for an empty list.
  #[allow(clippy::len_without_is_empty)]
  pub fn len(&self) -> usize {
    match self {
      SegmentTree::Leaf { .. } => 1,
      SegmentTree::Node { len, .. } => *len,
    }
  }

  /// Squared distance from `pt` to the closest segment.
  pub fn nearest_squared_distance(&self, pt: &Point<f64, 2>) -> f64 {
    let mut best = f64::INFINITY;
    self.nearest_inner(pt, &mut best);
    best
  }

  // Branch and bound: visit the closer child first and skip any subtree
  // whose box is farther than the best hit so far.
  fn nearest_inner(&self, pt: &Point<f64, 2>, best: &mut f64) {
    match self {
      SegmentTree::Leaf { segment, .. } => {
        let d = segment.as_ref().squared_distance_to(pt);
        if d < *best {
          *best = d;
        }
      }
      SegmentTree::Node { left, right, .. } => {
        let dl = left.aabb().squared_distance_to(pt);
        let dr = right.aabb().squared_distance_to(pt);
        let (near, d_near, far, d_far) = if dl <= dr {
          (left, dl, right, dr)
        } else {
          (right, dr, left, dl)
        };
        if d_near < *best {
          near.nearest_inner(pt, best);
        }
        if d_far < *best {
          far.nearest_inner(pt, best);
        }
      }
    }
  }
}

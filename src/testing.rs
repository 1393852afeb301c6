// This module contains strategies for:
//  * star-shaped rings
//  * polygons with a hole
//  * sizing parameters
// A Strategy is a way to generate a shrinkable value.
use crate::algorithms::sizing::SizingParams;
use crate::data::PolygonGeometry;

use core::ops::Range;
use proptest::collection::vec;
use proptest::prelude::*;
use std::f64::consts::TAU;

///////////////////////////////////////////////////////////////////////////////
// Star-shaped rings

// Angles are jittered inside their own sector, so vertices stay sorted by
// angle and the ring is simple and counter-clockwise.
fn star_ring(n: usize, jitter: Vec<f64>, radii: Vec<f64>) -> Vec<[f64; 2]> {
  let sector = TAU / n as f64;
  (0..n)
    .map(|i| {
      let angle = sector * i as f64 + jitter[i] * 0.4 * sector;
      [radii[i] * angle.cos(), radii[i] * angle.sin()]
    })
    .collect()
}

fn star(size: Range<usize>, radius: Range<f64>) -> impl Strategy<Value = Vec<[f64; 2]>> {
  let size = size.start.max(3)..size.end.max(4);
  size.prop_flat_map(move |n| {
    (vec(0.0..1.0f64, n), vec(radius.clone(), n))
      .prop_map(move |(jitter, radii)| star_ring(n, jitter, radii))
  })
}

/// Counter-clockwise star-shaped rings around the origin with `size` vertices
/// and radii in `[1, 10]`.
pub fn star_polygon(size: Range<usize>) -> impl Strategy<Value = Vec<[f64; 2]>> {
  star(size, 1.0..10.0)
}

/// A star-shaped outer ring (radii in `[4, 6]`) with a square hole around the
/// origin. With at least five vertices the hole stays clear of the outer ring.
pub fn polygon_with_hole(size: Range<usize>) -> impl Strategy<Value = PolygonGeometry> {
  let size = size.start.max(5)..size.end.max(6);
  (star(size, 4.0..6.0), 0.2..1.0f64).prop_map(|(outer, half)| {
    let hole = vec![[-half, -half], [half, -half], [half, half], [-half, half]];
    PolygonGeometry::new(outer, vec![hole])
  })
}

/// Valid sizing ramps with `size_min` in `[0.5, 2]`.
pub fn sizing_params() -> impl Strategy<Value = SizingParams> {
  (0.5..2.0f64, 1.0..4.0f64, 0.0..1.0f64, 0.5..10.0f64).prop_map(
    |(size_min, ratio, dist_min, span)| {
      SizingParams::new(size_min, size_min * ratio, dist_min, dist_min + span)
    },
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::Pslg;
  use claims::assert_ok;
  use test_strategy::proptest;

  #[proptest]
  fn star_polygons_load(#[strategy(star_polygon(3..30))] outer: Vec<[f64; 2]>) {
    let pslg = assert_ok!(Pslg::load(&PolygonGeometry::new(outer.clone(), vec![])));
    assert_eq!(pslg.points().len(), outer.len());
  }

  #[proptest]
  fn holes_load(#[strategy(polygon_with_hole(5..20))] polygon: PolygonGeometry) {
    let pslg = assert_ok!(Pslg::load(&polygon));
    assert_eq!(pslg.holes().len(), 1);
  }

  #[proptest]
  fn sizing_params_are_valid(#[strategy(sizing_params())] params: SizingParams) {
    assert_ok!(params.validate());
  }
}

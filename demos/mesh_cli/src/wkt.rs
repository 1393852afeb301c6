//! Reader for the one WKT form the mesher accepts: `POLYGON ((...), (...))`.
use anyhow::{anyhow, bail, Context, Result};
use rgeometry_mesh::data::PolygonGeometry;

/// Parse a WKT `POLYGON`. The first ring is the outer boundary, the others are
/// holes. Closing coordinates are kept; the loader drops them.
pub fn parse_polygon(text: &str) -> Result<PolygonGeometry> {
  let text = text.trim();
  let tag = text
    .get(..7)
    .filter(|tag| tag.eq_ignore_ascii_case("POLYGON"))
    .ok_or_else(|| anyhow!("expected a WKT POLYGON"))?;
  let body = text[tag.len()..].trim();
  if body.eq_ignore_ascii_case("EMPTY") {
    bail!("POLYGON EMPTY has no outer ring");
  }
  let body = body
    .strip_prefix('(')
    .and_then(|b| b.strip_suffix(')'))
    .ok_or_else(|| anyhow!("POLYGON body must be wrapped in parentheses"))?;

  let mut rings = Vec::new();
  let mut rest = body.trim();
  while !rest.is_empty() {
    let open = rest
      .strip_prefix('(')
      .ok_or_else(|| anyhow!("expected '(' at {:?}", truncate(rest)))?;
    let close = open
      .find(')')
      .ok_or_else(|| anyhow!("unterminated ring at {:?}", truncate(rest)))?;
    let ring = parse_ring(&open[..close]).with_context(|| format!("in ring {}", rings.len()))?;
    rings.push(ring);
    rest = open[close + 1..].trim_start();
    if let Some(next) = rest.strip_prefix(',') {
      rest = next.trim_start();
    } else if !rest.is_empty() {
      bail!("unexpected text after ring: {:?}", truncate(rest));
    }
  }

  let mut rings = rings.into_iter();
  let outer = rings.next().ok_or_else(|| anyhow!("POLYGON has no rings"))?;
  Ok(PolygonGeometry::new(outer, rings.collect()))
}

fn parse_ring(text: &str) -> Result<Vec<[f64; 2]>> {
  text
    .split(',')
    .map(|coord| -> Result<[f64; 2]> {
      let mut nums = coord.split_whitespace().map(str::parse::<f64>);
      match (nums.next(), nums.next(), nums.next()) {
        (Some(x), Some(y), None) => Ok([
          x.with_context(|| format!("bad x in {:?}", coord.trim()))?,
          y.with_context(|| format!("bad y in {:?}", coord.trim()))?,
        ]),
        _ => bail!("expected 'x y', got {:?}", coord.trim()),
      }
    })
    .collect()
}

fn truncate(s: &str) -> &str {
  s.char_indices().nth(24).map_or(s, |(idx, _)| &s[..idx])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn polygon_with_hole() {
    let polygon = parse_polygon(
      "POLYGON ((0 0, 40 0, 40 40, 0 40, 0 0), (15 15, 25 15, 25 25, 15 25, 15 15))",
    )
    .unwrap();
    assert_eq!(polygon.outer.len(), 5);
    assert_eq!(polygon.outer[1], [40.0, 0.0]);
    assert_eq!(polygon.holes.len(), 1);
    assert_eq!(polygon.holes[0][2], [25.0, 25.0]);
  }

  #[test]
  fn whitespace_and_case() {
    let polygon = parse_polygon("  polygon((\n  0 0,\n  1.5 0,\n  0 -2e1\n))\n").unwrap();
    assert_eq!(polygon.outer, vec![[0.0, 0.0], [1.5, 0.0], [0.0, -20.0]]);
    assert!(polygon.holes.is_empty());
  }

  #[test]
  fn rejects_other_shapes() {
    assert!(parse_polygon("POINT (1 2)").is_err());
    assert!(parse_polygon("POLYGON EMPTY").is_err());
    assert!(parse_polygon("POLYGON ((0 0, 1 0, 1 1)").is_err());
    assert!(parse_polygon("POLYGON ((0 0 1, 1 0 1, 1 1 1))").is_err());
    assert!(parse_polygon("POLYGON ((0 0, 1 x, 1 1))").is_err());
    assert!(parse_polygon("POLYGON ()").is_err());
  }
}

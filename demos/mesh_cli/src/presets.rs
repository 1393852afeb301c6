//! Built-in geometries, in millimeters.
use anyhow::{anyhow, Result};
use rgeometry_mesh::data::PolygonGeometry;

use crate::wkt;

pub const PRESETS: &[(&str, &str)] = &[
  (
    "L-Shape",
    "POLYGON ((0 0, 30 0, 30 20, 10 20, 10 30, 0 30, 0 0))",
  ),
  (
    "Rectangle with Square Hole",
    "POLYGON ((0 0, 40 0, 40 40, 0 40, 0 0), (15 15, 25 15, 25 25, 15 25, 15 15))",
  ),
  (
    "Complex Shape",
    "POLYGON ((0 0, 50 0, 50 20, 40 20, 40 30, 30 30, 30 40, 20 40, 20 30, 10 30, 10 20, 0 20, 0 0))",
  ),
  (
    "T-Shape",
    "POLYGON ((0 0, 40 0, 40 10, 30 10, 30 30, 20 30, 20 10, 10 10, 10 30, 0 30, 0 0))",
  ),
  (
    "Multiple Holes",
    "POLYGON ((0 0, 60 0, 60 40, 0 40, 0 0), \
     (10 10, 20 10, 20 20, 10 20, 10 10), \
     (40 10, 50 10, 50 20, 40 20, 40 10), \
     (30 25, 40 25, 40 35, 30 35, 30 25))",
  ),
  (
    "Hexagon",
    "POLYGON ((25 0, 45 15, 45 35, 25 50, 5 35, 5 15, 25 0))",
  ),
  (
    "Star Shape",
    "POLYGON ((25 0, 30 20, 50 20, 35 30, 40 50, 25 40, 10 50, 15 30, 0 20, 20 20, 25 0))",
  ),
];

/// Look up a preset by name. Case, spaces, dashes and underscores are
/// ignored, so `l-shape` and `multiple_holes` both work.
pub fn find(name: &str) -> Result<PolygonGeometry> {
  let wanted = normalize(name);
  let (_, text) = PRESETS
    .iter()
    .find(|(preset, _)| normalize(preset) == wanted)
    .ok_or_else(|| {
      let names: Vec<&str> = PRESETS.iter().map(|(name, _)| *name).collect();
      anyhow!("unknown preset {:?}, expected one of: {}", name, names.join(", "))
    })?;
  wkt::parse_polygon(text)
}

fn normalize(name: &str) -> String {
  name
    .chars()
    .filter(|c| c.is_alphanumeric())
    .flat_map(char::to_lowercase)
    .collect()
}

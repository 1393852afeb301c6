use serde::{Deserialize, Serialize};

/// Input shapes accepted by the mesher.
///
/// Serialized with an explicit `kind` tag:
///
/// ```rust
/// # use rgeometry_mesh::data::{Geometry, PolygonGeometry};
/// let json = r#"{"kind":"polygon","outer":[[0,0],[1,0],[0,1]]}"#;
/// let geometry: Geometry = serde_json::from_str(json).unwrap();
/// let Geometry::Polygon(polygon) = geometry;
/// assert_eq!(polygon.outer.len(), 3);
/// assert!(polygon.holes.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
  Polygon(PolygonGeometry),
}

/// Outer ring plus zero or more holes. Rings may repeat their first
/// coordinate at the end and may be given in either orientation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonGeometry {
  pub outer: Vec<[f64; 2]>,
  #[serde(default)]
  pub holes: Vec<Vec<[f64; 2]>>,
}

impl PolygonGeometry {
  pub fn new(outer: Vec<[f64; 2]>, holes: Vec<Vec<[f64; 2]>>) -> PolygonGeometry {
    PolygonGeometry { outer, holes }
  }

  pub fn ring_count(&self) -> usize {
    1 + self.holes.len()
  }
}

impl From<PolygonGeometry> for Geometry {
  fn from(polygon: PolygonGeometry) -> Geometry {
    Geometry::Polygon(polygon)
  }
}

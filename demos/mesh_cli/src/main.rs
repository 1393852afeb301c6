use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use serde::Serialize;

use rgeometry_mesh::algorithms::{QualityBounds, RefinementBudget, SizingParams};
use rgeometry_mesh::data::{Geometry, PolygonGeometry};
use rgeometry_mesh::export::{Mesh, MeshStats};
use rgeometry_mesh::{Error, MeshOptions, MeshSession};

mod presets;
mod wkt;

/// Boundary-graded triangular meshes for polygons with holes
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
  #[clap(subcommand)]
  cmd: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Mesh one geometry and write the result as JSON
  Mesh {
    #[clap(flatten)]
    input: InputSettings,

    /// Hole ring for `--coords`, same syntax; may be repeated
    #[clap(long, requires = "coords")]
    hole: Vec<String>,

    #[clap(flatten)]
    settings: MeshSettings,

    /// Name of a `.json` file to write (stdout if omitted)
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Export the last valid mesh if refinement stalls
    #[clap(long)]
    keep_partial: bool,
  },

  /// List the built-in geometries
  Presets,

  /// Mesh every built-in geometry and print a table
  Summary {
    #[clap(flatten)]
    settings: MeshSettings,
  },
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct InputSettings {
  /// WKT file holding a single POLYGON
  #[clap(long)]
  wkt: Option<PathBuf>,

  /// Built-in geometry (see `presets`)
  #[clap(short, long)]
  preset: Option<String>,

  /// Outer ring as "x1,y1; x2,y2; ..."
  #[clap(long)]
  coords: Option<String>,
}

#[derive(clap::Args)]
struct MeshSettings {
  /// Element size at the boundary
  #[clap(long, default_value_t = 1.5)]
  size_min: f64,

  /// Element size far from the boundary
  #[clap(long, default_value_t = 5.0)]
  size_max: f64,

  /// Distance up to which `size_min` applies [default: 0.5 * size-min]
  #[clap(long)]
  dist_min: Option<f64>,

  /// Distance from which `size_max` applies [default: 5 * size-max]
  #[clap(long)]
  dist_max: Option<f64>,

  /// Minimum interior angle in degrees
  #[clap(long, default_value_t = 20.0)]
  min_angle: f64,

  /// Maximum number of refinement steps
  #[clap(long, default_value_t = 200_000)]
  max_steps: usize,

  /// JSON file with the full mesh options; overrides the flags above
  #[clap(long)]
  config: Option<PathBuf>,
}

impl MeshSettings {
  fn options(&self) -> Result<MeshOptions> {
    if let Some(path) = &self.config {
      let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
      return serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()));
    }
    Ok(MeshOptions {
      sizing: SizingParams::new(
        self.size_min,
        self.size_max,
        self.dist_min.unwrap_or(0.5 * self.size_min),
        self.dist_max.unwrap_or(5.0 * self.size_max),
      ),
      quality: QualityBounds::new(self.min_angle),
      budget: RefinementBudget::new(self.max_steps),
    })
  }
}

#[derive(Serialize)]
struct MeshOutput<'a> {
  success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
  partial: bool,
  points: &'a [[f64; 2]],
  triangles: &'a [[usize; 3]],
  outer_coords: &'a [[f64; 2]],
  holes: &'a [Vec<[f64; 2]>],
  num_points: usize,
  num_triangles: usize,
  stats: MeshStats,
}

#[derive(Serialize)]
struct Failure {
  success: bool,
  error: String,
}

////////////////////////////////////////////////////////////////////////////////

fn parse_coords(text: &str) -> Result<Vec<[f64; 2]>> {
  text
    .split(';')
    .filter(|pair| !pair.trim().is_empty())
    .map(|pair| -> Result<[f64; 2]> {
      let (x, y) = pair
        .split_once(',')
        .ok_or_else(|| anyhow!("expected 'x,y', got {:?}", pair.trim()))?;
      let x = x.trim().parse().with_context(|| format!("bad x in {:?}", pair.trim()))?;
      let y = y.trim().parse().with_context(|| format!("bad y in {:?}", pair.trim()))?;
      Ok([x, y])
    })
    .collect()
}

fn load_input(input: &InputSettings, holes: &[String]) -> Result<PolygonGeometry> {
  if let Some(path) = &input.wkt {
    let text =
      std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    return wkt::parse_polygon(&text).with_context(|| format!("parsing {}", path.display()));
  }
  if let Some(name) = &input.preset {
    return presets::find(name);
  }
  if let Some(coords) = &input.coords {
    let outer = parse_coords(coords).context("parsing --coords")?;
    let holes = holes
      .iter()
      .map(|hole| parse_coords(hole).context("parsing --hole"))
      .collect::<Result<_>>()?;
    return Ok(PolygonGeometry::new(outer, holes));
  }
  bail!("one of --wkt, --preset or --coords is required")
}

// The error is kept when refinement stalled and a partial mesh was requested.
fn run_mesh(
  polygon: &PolygonGeometry,
  options: &MeshOptions,
  keep_partial: bool,
) -> Result<(Mesh, Option<Error>), Error> {
  let start = Instant::now();
  let geometry = Geometry::Polygon(polygon.clone());
  let mut session = MeshSession::new(&geometry, options)?;
  info!(
    "Triangulated {} input points in {:?}",
    session.pslg().points().len(),
    start.elapsed()
  );
  match session.refine() {
    Ok(report) => {
      info!(
        "Refined with {} steiner points in {:?}",
        report.steiner_points,
        start.elapsed()
      );
      Ok((session.export().unwrap_or_default(), None))
    }
    Err(err @ Error::RefinementStalled { .. }) if keep_partial => {
      warn!("{}; keeping the partial mesh", err);
      Ok((session.export().unwrap_or_default(), Some(err)))
    }
    Err(err) => Err(err),
  }
}

fn write_json<T: Serialize>(value: &T, out: Option<&PathBuf>) -> Result<()> {
  let text = serde_json::to_string_pretty(value)?;
  match out {
    Some(path) => {
      std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
      info!("Wrote {}", path.display());
    }
    None => println!("{}", text),
  }
  Ok(())
}

fn mesh_command(
  input: &InputSettings,
  holes: &[String],
  settings: &MeshSettings,
  out: Option<&PathBuf>,
  keep_partial: bool,
) -> Result<bool> {
  let options = settings.options()?;
  let polygon = match load_input(input, holes) {
    Ok(polygon) => polygon,
    Err(err) => {
      let failure = Failure {
        success: false,
        error: format!("{:#}", err),
      };
      write_json(&failure, out)?;
      return Ok(false);
    }
  };
  match run_mesh(&polygon, &options, keep_partial) {
    Ok((mesh, stalled)) => {
      let output = MeshOutput {
        success: true,
        error: stalled.as_ref().map(ToString::to_string),
        partial: stalled.is_some(),
        points: &mesh.points,
        triangles: &mesh.triangles,
        outer_coords: &polygon.outer,
        holes: &polygon.holes,
        num_points: mesh.points.len(),
        num_triangles: mesh.triangles.len(),
        stats: mesh.stats(),
      };
      write_json(&output, out)?;
      Ok(true)
    }
    Err(err) => {
      write_json(
        &Failure {
          success: false,
          error: err.to_string(),
        },
        out,
      )?;
      Ok(false)
    }
  }
}

fn summary_command(settings: &MeshSettings) -> Result<bool> {
  let options = settings.options()?;
  let mut all_ok = true;
  println!("{:<28} {:<10} {:<12} {:<10}", "Geometry", "Points", "Triangles", "Min angle");
  println!("{}", "-".repeat(64));
  for (name, _) in presets::PRESETS {
    let polygon = presets::find(name)?;
    match run_mesh(&polygon, &options, false) {
      Ok((mesh, _)) => {
        let stats = mesh.stats();
        println!(
          "{:<28} {:<10} {:<12} {:<10.2}",
          name, stats.points, stats.triangles, stats.min_angle
        );
      }
      Err(err) => {
        all_ok = false;
        println!("{:<28} failed: {}", name, err);
      }
    }
  }
  println!("\nTotal geometries processed: {}", presets::PRESETS.len());
  Ok(all_ok)
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

  let args = Args::parse();
  let ok = match &args.cmd {
    Command::Mesh {
      input,
      hole,
      settings,
      out,
      keep_partial,
    } => mesh_command(input, hole, settings, out.as_ref(), *keep_partial)?,
    Command::Presets => {
      for (name, _) in presets::PRESETS {
        let polygon = presets::find(name)?;
        println!(
          "{:<28} {} points, {} holes",
          name,
          polygon.outer.len() - 1,
          polygon.holes.len()
        );
      }
      true
    }
    Command::Summary { settings } => summary_command(settings)?,
  };
  if !ok {
    std::process::exit(1);
  }
  Ok(())
}

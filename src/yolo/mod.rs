//! YOLO label emission: class mapping, label lines, and dataset manifests.
//!
//! Output follows the Ultralytics directory convention: `images/` +
//! `labels/` under a dataset root, with `classes.txt` and `data.yaml`
//! alongside. Normalized floats are written at 6 decimal places.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Sly2YoloError;
use crate::geom::{BBoxXYXY, Coord, Pixel};

/// Accumulates the run-scoped class-name -> ID mapping.
///
/// IDs are dense, zero-based, and assigned in first-seen order. The map is
/// owned by the batch loop and passed by reference into each per-file step;
/// it is never global state.
#[derive(Debug, Default)]
pub struct ClassMap {
    names: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the ID for `name`, assigning the next sequential ID on first
    /// sight.
    pub fn id_for(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let id = self.names.len();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Class names in ID order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Why a single shape could not be rendered as a label line.
///
/// Shape failures are recoverable: the orchestrator records them on the
/// batch report instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Rectangle geometry carried fewer than two exterior points.
    TooFewRectanglePoints { found: usize },
    /// Polygon geometry carried an empty exterior ring.
    EmptyPolygonExterior,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::TooFewRectanglePoints { found } => {
                write!(f, "rectangle needs 2 exterior points, found {}", found)
            }
            ShapeError::EmptyPolygonExterior => write!(f, "polygon has an empty exterior ring"),
        }
    }
}

/// Render a rectangle shape as a `<class_id> <cx> <cy> <w> <h>` label line.
///
/// The first two exterior points are opposite corners in arbitrary order.
pub fn rectangle_label_line(
    class_id: usize,
    exterior: &[[f64; 2]],
    image_width: u32,
    image_height: u32,
) -> Result<String, ShapeError> {
    let [corner_a, corner_b] = match exterior {
        [a, b, ..] => [a, b],
        _ => {
            return Err(ShapeError::TooFewRectanglePoints {
                found: exterior.len(),
            })
        }
    };

    let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_corners(
        Coord::new(corner_a[0], corner_a[1]),
        Coord::new(corner_b[0], corner_b[1]),
    );
    let (cx, cy, w, h) = bbox
        .to_normalized(image_width as f64, image_height as f64)
        .to_cxcywh();

    Ok(format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_id, cx, cy, w, h
    ))
}

/// Render a polygon shape as a `<class_id> <x1> <y1> ... <xk> <yk>` label
/// line, preserving vertex order exactly.
pub fn polygon_label_line(
    class_id: usize,
    exterior: &[[f64; 2]],
    image_width: u32,
    image_height: u32,
) -> Result<String, ShapeError> {
    if exterior.is_empty() {
        return Err(ShapeError::EmptyPolygonExterior);
    }

    let mut line = class_id.to_string();
    for [x, y] in exterior {
        let point =
            Coord::<Pixel>::new(*x, *y).to_normalized(image_width as f64, image_height as f64);
        write!(line, " {:.6} {:.6}", point.x, point.y).expect("write to String cannot fail");
    }

    Ok(line)
}

/// Write `classes.txt`: one `<id>: <name>` line per class, ascending ID.
pub fn write_classes_txt(output_root: &Path, classes: &ClassMap) -> Result<(), Sly2YoloError> {
    let mut content = String::new();
    for (id, name) in classes.names().iter().enumerate() {
        writeln!(content, "{}: {}", id, name).expect("write to String cannot fail");
    }

    fs::write(output_root.join("classes.txt"), content).map_err(Sly2YoloError::Io)
}

/// Write the Ultralytics `data.yaml` manifest.
///
/// The converter passes `images` for both subsets (no split has happened
/// yet); the splitter rewrites them as `train/images` and `val/images`.
pub fn write_data_yaml(
    output_root: &Path,
    names: &[String],
    train: &str,
    val: &str,
) -> Result<(), Sly2YoloError> {
    let absolute_root = std::path::absolute(output_root).map_err(Sly2YoloError::Io)?;

    let mut yaml = String::new();
    yaml.push_str(&format!("path: {}\n", absolute_root.display()));
    yaml.push_str(&format!("train: {}\n", train));
    yaml.push_str(&format!("val: {}\n", val));
    yaml.push_str(&format!("nc: {}\n", names.len()));
    yaml.push_str("names:\n");
    for (id, name) in names.iter().enumerate() {
        yaml.push_str(&format!("  {}: {}\n", id, yaml_single_quoted(name)));
    }

    fs::write(output_root.join("data.yaml"), yaml).map_err(Sly2YoloError::Io)
}

pub(crate) fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

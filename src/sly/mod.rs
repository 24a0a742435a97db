//! Supervisely annotation-export reader.
//!
//! Supervisely exports one JSON document per image, conventionally named
//! `<image filename>.json` (so `photo.jpg` gets `photo.jpg.json`). Only the
//! fields the converter consumes are modeled; everything else is ignored.

use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::Sly2YoloError;

/// Image extensions recognized both when indexing the image directory and
/// when stripping an embedded extension fragment from annotation filenames.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];

/// One Supervisely annotation document.
#[derive(Debug, Deserialize)]
pub struct SlyAnnotation {
    pub size: SlySize,
    #[serde(default)]
    pub objects: Vec<SlyObject>,
    #[serde(default)]
    pub tags: Vec<SlyTag>,
}

/// Pixel dimensions of the annotated image.
#[derive(Debug, Deserialize)]
pub struct SlySize {
    pub width: u32,
    pub height: u32,
}

/// One labeled geometric region.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlyObject {
    pub class_title: String,
    pub geometry_type: String,
    #[serde(default)]
    pub points: SlyPoints,
}

/// Geometry point data. The exterior ring carries the shape; interior rings
/// (polygon holes) have no YOLO representation and are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SlyPoints {
    #[serde(default)]
    pub exterior: Vec<[f64; 2]>,
}

/// A whole-image class label with no geometry.
#[derive(Debug, Deserialize)]
pub struct SlyTag {
    pub name: String,
}

/// Read one annotation file.
pub fn read_annotation(path: &Path) -> Result<SlyAnnotation, Sly2YoloError> {
    let file = File::open(path).map_err(Sly2YoloError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| Sly2YoloError::AnnotationParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Derive the image base name for an annotation file.
///
/// Strips the `.json` extension, then one trailing image-extension fragment
/// if present: `photo.jpg.json` -> `photo`, `photo.json` -> `photo`.
pub fn annotation_base_name(path: &Path) -> Option<String> {
    let stem = path.file_stem().and_then(OsStr::to_str)?;

    let base = match stem.rsplit_once('.') {
        Some((prefix, fragment)) if is_image_extension(fragment) => prefix,
        _ => stem,
    };

    Some(base.to_string())
}

/// Case-insensitive check against the recognized image extensions.
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

/// True if the path has one of the given extensions (case-insensitive).
pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

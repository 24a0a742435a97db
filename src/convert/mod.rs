//! Supervisely -> YOLO batch conversion.
//!
//! A single linear pass: index the image directory, enumerate annotation
//! files in sorted order, and for each one resolve its image, render label
//! lines, and copy the image into the output tree. Per-file failures are
//! recorded on the [`ConvertReport`] and never abort the batch; manifests
//! are written once after the loop completes.

pub mod report;

pub use report::{ConvertCounts, ConvertIssue, ConvertIssueCode, ConvertReport, ConvertSeverity};

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Sly2YoloError;
use crate::sly;
use crate::yolo::{self, ClassMap};

/// Options for one conversion run.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Directory of per-image Supervisely JSON files.
    pub ann_dir: PathBuf,
    /// Directory of image files, matched to annotations by filename stem.
    pub img_dir: PathBuf,
    /// Output dataset root; `images/` and `labels/` are created under it.
    pub output: PathBuf,
}

enum FileOutcome {
    Converted { label_lines: usize },
    Skipped,
}

/// Run the full conversion batch.
///
/// Fails up front if either input directory is missing; after that, only
/// output I/O errors abort the run.
pub fn convert_dataset(opts: &ConvertOptions) -> Result<ConvertReport, Sly2YoloError> {
    for dir in [&opts.ann_dir, &opts.img_dir] {
        if !dir.is_dir() {
            return Err(Sly2YoloError::MissingInputDir { path: dir.clone() });
        }
    }

    let labels_dir = opts.output.join("labels");
    let images_dir = opts.output.join("images");
    fs::create_dir_all(&labels_dir).map_err(Sly2YoloError::Io)?;
    fs::create_dir_all(&images_dir).map_err(Sly2YoloError::Io)?;

    let image_index = index_images(&opts.img_dir)?;
    let ann_files = collect_annotation_files(&opts.ann_dir)?;

    let mut report = ConvertReport::default();
    report.counts.annotations = ann_files.len();
    report.add(ConvertIssue::info(
        ConvertIssueCode::ClassIdAssignment,
        "annotation files are processed in lexicographic filename order; \
         class IDs are assigned sequentially on first sight",
    ));

    let mut classes = ClassMap::new();

    for ann_path in &ann_files {
        match convert_file(
            ann_path,
            &image_index,
            &labels_dir,
            &images_dir,
            &mut classes,
            &mut report,
        )? {
            FileOutcome::Converted { label_lines } => {
                report.counts.processed += 1;
                report.counts.label_lines += label_lines;
            }
            FileOutcome::Skipped => report.counts.skipped += 1,
        }
    }

    yolo::write_classes_txt(&opts.output, &classes)?;
    yolo::write_data_yaml(&opts.output, classes.names(), "images", "images")?;

    report.classes = classes.names().to_vec();
    Ok(report)
}

/// Process one annotation file end to end.
///
/// Recoverable failures are recorded on the report and yield `Skipped`;
/// only output I/O errors propagate.
fn convert_file(
    ann_path: &Path,
    image_index: &BTreeMap<String, PathBuf>,
    labels_dir: &Path,
    images_dir: &Path,
    classes: &mut ClassMap,
    report: &mut ConvertReport,
) -> Result<FileOutcome, Sly2YoloError> {
    let ann_name = ann_path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("<non-utf8>")
        .to_string();

    let Some(base_name) = sly::annotation_base_name(ann_path) else {
        report.add(ConvertIssue::warning(
            ConvertIssueCode::ImageNotFound,
            format!("cannot derive a base name for '{}'", ann_name),
        ));
        return Ok(FileOutcome::Skipped);
    };

    let Some(image_path) = image_index.get(&base_name) else {
        report.add(ConvertIssue::warning(
            ConvertIssueCode::ImageNotFound,
            format!("no image found for '{}' ({})", base_name, ann_name),
        ));
        return Ok(FileOutcome::Skipped);
    };

    let ann = match sly::read_annotation(ann_path) {
        Ok(ann) => ann,
        Err(err) => {
            report.add(ConvertIssue::warning(
                ConvertIssueCode::AnnotationParse,
                err.to_string(),
            ));
            return Ok(FileOutcome::Skipped);
        }
    };

    let (width, height) = (ann.size.width, ann.size.height);
    if width == 0 || height == 0 {
        report.add(ConvertIssue::warning(
            ConvertIssueCode::InvalidImageDimensions,
            format!("'{}' declares size {}x{}", base_name, width, height),
        ));
        return Ok(FileOutcome::Skipped);
    }

    // Header-only probe; undecodable files skip the cross-check.
    if let Ok(probed) = imagesize::size(image_path) {
        if probed.width != width as usize || probed.height != height as usize {
            report.add(ConvertIssue::warning(
                ConvertIssueCode::DimensionMismatch,
                format!(
                    "'{}': annotation says {}x{}, image header says {}x{}",
                    base_name, width, height, probed.width, probed.height
                ),
            ));
        }
    }

    let mut lines: Vec<String> = Vec::with_capacity(ann.objects.len());

    if !ann.objects.is_empty() {
        for object in &ann.objects {
            // Registered before geometry dispatch, so a class is known even
            // when its shape cannot be rendered.
            let class_id = classes.id_for(&object.class_title);

            let rendered = match object.geometry_type.as_str() {
                "rectangle" => {
                    yolo::rectangle_label_line(class_id, &object.points.exterior, width, height)
                }
                "polygon" => {
                    yolo::polygon_label_line(class_id, &object.points.exterior, width, height)
                }
                other => {
                    report.add(ConvertIssue::warning(
                        ConvertIssueCode::UnsupportedGeometry,
                        format!(
                            "'{}': unsupported geometry '{}' for class '{}'",
                            base_name, other, object.class_title
                        ),
                    ));
                    continue;
                }
            };

            match rendered {
                Ok(line) => lines.push(line),
                Err(shape_err) => {
                    report.add(ConvertIssue::warning(
                        ConvertIssueCode::MalformedGeometry,
                        format!("'{}': {}", base_name, shape_err),
                    ));
                    return Ok(FileOutcome::Skipped);
                }
            }
        }
    } else {
        for tag in &ann.tags {
            classes.id_for(&tag.name);
        }
    }

    // Label file is written even when empty (tags-only or no objects).
    fs::write(
        labels_dir.join(format!("{}.txt", base_name)),
        lines.join("\n"),
    )
    .map_err(Sly2YoloError::Io)?;

    let image_file_name = image_path
        .file_name()
        .expect("indexed image paths always have a file name");
    fs::copy(image_path, images_dir.join(image_file_name)).map_err(Sly2YoloError::Io)?;

    Ok(FileOutcome::Converted {
        label_lines: lines.len(),
    })
}

/// Index the image directory by filename stem (top level only).
///
/// All files participate; a Supervisely export keeps nothing but images in
/// this directory.
fn index_images(img_dir: &Path) -> Result<BTreeMap<String, PathBuf>, Sly2YoloError> {
    let mut index = BTreeMap::new();

    for entry in WalkDir::new(img_dir).max_depth(1) {
        let entry = entry.map_err(|source| Sly2YoloError::Io(source.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(stem) = entry.path().file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        index.insert(stem.to_string(), entry.path().to_path_buf());
    }

    Ok(index)
}

/// Enumerate `*.json` files (case-insensitive) sorted by filename.
fn collect_annotation_files(ann_dir: &Path) -> Result<Vec<PathBuf>, Sly2YoloError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(ann_dir).max_depth(1) {
        let entry = entry.map_err(|source| Sly2YoloError::Io(source.into()))?;
        if entry.file_type().is_file() && sly::has_extension(entry.path(), &["json"]) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by_cached_key(|path| path.file_name().map(OsStr::to_os_string));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_dir_is_a_configuration_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let opts = ConvertOptions {
            ann_dir: temp.path().join("does-not-exist"),
            img_dir: temp.path().to_path_buf(),
            output: temp.path().join("out"),
        };

        let err = convert_dataset(&opts).unwrap_err();
        assert!(matches!(err, Sly2YoloError::MissingInputDir { .. }));
        // Aborted before any output was produced.
        assert!(!opts.output.exists());
    }

    #[test]
    fn annotation_enumeration_is_sorted_by_filename() {
        let temp = tempfile::tempdir().expect("create temp dir");
        for name in ["c.json", "a.json", "b.json", "ignored.txt"] {
            fs::write(temp.path().join(name), "{}").expect("write file");
        }

        let files = collect_annotation_files(temp.path()).expect("collect");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.json", "b.json", "c.json"]);
    }

    #[test]
    fn image_index_keys_by_stem() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("a.jpg"), b"x").expect("write file");
        fs::write(temp.path().join("b.png"), b"x").expect("write file");
        fs::create_dir(temp.path().join("nested")).expect("create dir");
        fs::write(temp.path().join("nested/c.jpg"), b"x").expect("write file");

        let index = index_images(temp.path()).expect("index");
        assert!(index.contains_key("a"));
        assert!(index.contains_key("b"));
        // Top level only.
        assert!(!index.contains_key("c"));
    }
}

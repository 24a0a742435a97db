//! Train/validation splitting for converted datasets.
//!
//! Copies image/label pairs from a flat `images/` + `labels/` dataset into
//! `train/` and `val/` subtrees. Selection is a uniform shuffle, seedable
//! for reproducible splits; the randomization itself is delegated to the
//! `rand` crate.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::Sly2YoloError;
use crate::sly::{self, IMAGE_EXTENSIONS};
use crate::yolo;

/// Options for one split run.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    /// Converted dataset root (must contain `images/`).
    pub input: PathBuf,
    /// Output root; `train/` and `val/` are created under it.
    pub output: PathBuf,
    /// Fraction of images assigned to validation, in (0.0, 1.0).
    pub val_fraction: f64,
    /// Seed for the shuffle; `None` uses an OS-seeded RNG.
    pub seed: Option<u64>,
}

/// Result of one split run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub total: usize,
    pub train: usize,
    pub val: usize,
    /// Images copied without a sibling label file.
    pub missing_labels: usize,
    /// Whether a `data.yaml` was rewritten at the output root.
    pub manifest_written: bool,
}

impl fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} image(s): {} train, {} val",
            self.total, self.train, self.val
        )?;
        if self.missing_labels > 0 {
            writeln!(
                f,
                "  {} image(s) had no label file and were copied without one",
                self.missing_labels
            )?;
        }
        if self.manifest_written {
            writeln!(f, "  data.yaml rewritten for the split layout")?;
        }
        Ok(())
    }
}

/// Validate split options before running.
pub fn validate_split_options(opts: &SplitOptions) -> Result<(), Sly2YoloError> {
    if !(0.0 < opts.val_fraction && opts.val_fraction < 1.0) {
        return Err(Sly2YoloError::InvalidSplitParams {
            message: "--val-fraction must be in the interval (0.0, 1.0)".to_string(),
        });
    }

    Ok(())
}

/// Split a converted dataset into train/val subsets by copying files.
pub fn split_dataset(opts: &SplitOptions) -> Result<SplitSummary, Sly2YoloError> {
    validate_split_options(opts)?;

    let images_dir = opts.input.join("images");
    if !images_dir.is_dir() {
        return Err(Sly2YoloError::MissingInputDir { path: images_dir });
    }
    let labels_dir = opts.input.join("labels");

    let mut images = collect_image_files(&images_dir)?;
    if images.len() < 2 {
        return Err(Sly2YoloError::SplitFailed {
            message: format!("need at least 2 images to split, found {}", images.len()),
        });
    }

    if let Some(seed) = opts.seed {
        let mut rng = StdRng::seed_from_u64(seed);
        images.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        images.shuffle(&mut rng);
    }

    let total = images.len();
    let val_count = val_image_count(total, opts.val_fraction);
    let (val_images, train_images) = images.split_at(val_count);

    let mut missing_labels = 0;
    for (subset, subset_images) in [("train", train_images), ("val", val_images)] {
        let subset_images_dir = opts.output.join(subset).join("images");
        let subset_labels_dir = opts.output.join(subset).join("labels");
        fs::create_dir_all(&subset_images_dir).map_err(Sly2YoloError::Io)?;
        fs::create_dir_all(&subset_labels_dir).map_err(Sly2YoloError::Io)?;

        for image_path in subset_images {
            let file_name = image_path
                .file_name()
                .expect("collected image paths always have a file name");
            fs::copy(image_path, subset_images_dir.join(file_name)).map_err(Sly2YoloError::Io)?;

            let label_name = Path::new(file_name).with_extension("txt");
            let label_src = labels_dir.join(&label_name);
            if label_src.is_file() {
                fs::copy(&label_src, subset_labels_dir.join(&label_name))
                    .map_err(Sly2YoloError::Io)?;
            } else {
                missing_labels += 1;
            }
        }
    }

    let manifest_written = rewrite_manifest(&opts.input, &opts.output)?;

    Ok(SplitSummary {
        total,
        train: train_images.len(),
        val: val_count,
        missing_labels,
        manifest_written,
    })
}

/// Validation subset size: `ceil(total * fraction)` clamped so that both
/// subsets stay non-empty.
pub fn val_image_count(total: usize, fraction: f64) -> usize {
    if total < 2 {
        return 0;
    }

    let raw = (total as f64 * fraction).ceil() as usize;
    raw.clamp(1, total - 1)
}

/// Enumerate top-level image files sorted by filename, so the shuffle input
/// is deterministic for a given seed.
fn collect_image_files(images_dir: &Path) -> Result<Vec<PathBuf>, Sly2YoloError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(images_dir).max_depth(1) {
        let entry = entry.map_err(|source| Sly2YoloError::Io(source.into()))?;
        if entry.file_type().is_file() && sly::has_extension(entry.path(), &IMAGE_EXTENSIONS) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by_cached_key(|path| path.file_name().map(OsStr::to_os_string));
    Ok(files)
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Rewrite the dataset manifest for the split layout, when the input has
/// one. Returns whether a manifest was written.
fn rewrite_manifest(input_root: &Path, output_root: &Path) -> Result<bool, Sly2YoloError> {
    let manifest = input_root.join("data.yaml");
    if !manifest.is_file() {
        return Ok(false);
    }

    let names = read_manifest_names(&manifest)?;
    yolo::write_data_yaml(output_root, &names, "train/images", "val/images")?;
    Ok(true)
}

fn read_manifest_names(path: &Path) -> Result<Vec<String>, Sly2YoloError> {
    let data = fs::read_to_string(path).map_err(Sly2YoloError::Io)?;
    let parsed: DataYaml =
        serde_yaml::from_str(&data).map_err(|source| Sly2YoloError::DataYamlParse {
            path: path.to_path_buf(),
            source,
        })?;

    let names = match parsed.names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            if mapping.is_empty() {
                Vec::new()
            } else {
                let max_index = *mapping.keys().max().expect("checked non-empty");
                let mut names = vec![String::new(); max_index + 1];
                for (index, name) in mapping {
                    names[index] = name;
                }
                for (index, name) in names.iter_mut().enumerate() {
                    if name.trim().is_empty() {
                        *name = format!("class_{}", index);
                    }
                }
                names
            }
        }
    };

    Ok(names)
}

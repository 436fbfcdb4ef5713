//! Folder restructuring for training frameworks.
//!
//! - [`ultralytics_layout`] turns `images/{split}` + `labels/{split}` into
//!   `{split}/images` + `{split}/labels`.
//! - [`rf_detr_layout`] builds `{train,valid,test}/` folders, each with a
//!   `_annotations.coco.json` and the split's images, from a COCO split tree.
//!
//! Stratified splits of small datasets can leave a split empty, so a missing
//! split directory is logged and skipped rather than treated as an error.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::CocoprepError;
use crate::split::Split;

/// Annotation file name RF-DETR expects in every split folder.
pub const RF_DETR_ANNOTATION_FILE: &str = "_annotations.coco.json";

/// What a layout step found and moved for one split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LayoutSplit {
    pub split: Split,
    pub annotations: bool,
    pub files: usize,
}

/// Restructure a YOLO tree under `base` in place for Ultralytics.
///
/// Before: `images/{split}/`, `labels/{split}/`, `<yaml_file>`.
/// After: `{split}/images/`, `{split}/labels/`, `<yaml_file>`.
///
/// The new tree is assembled in a scratch directory inside `base` that is
/// removed on every exit path, then moved into place.
pub fn ultralytics_layout(
    base: &Path,
    yaml_file: &str,
) -> Result<Vec<LayoutSplit>, CocoprepError> {
    if !base.is_dir() {
        return Err(CocoprepError::DatasetLayout {
            path: base.to_path_buf(),
            message: "YOLO output directory does not exist".to_string(),
        });
    }

    let staging = tempfile::Builder::new()
        .prefix(".restructure-")
        .tempdir_in(base)
        .map_err(CocoprepError::io_at(base))?;

    let mut report = Vec::new();
    for split in Split::ALL {
        let split_dir = staging.path().join(split.name());
        fs::create_dir_all(&split_dir).map_err(CocoprepError::io_at(&split_dir))?;

        let mut files = 0;
        let mut has_labels = false;
        for kind in ["images", "labels"] {
            let src = base.join(kind).join(split.name());
            if !src.is_dir() {
                warn!("{} not found; skipping", src.display());
                continue;
            }
            files += copy_dir(&src, &split_dir.join(kind))?;
            has_labels |= kind == "labels";
        }

        report.push(LayoutSplit {
            split,
            annotations: has_labels,
            files,
        });
    }

    let yaml_src = base.join(yaml_file);
    if yaml_src.is_file() {
        let yaml_dst = staging.path().join(yaml_file);
        fs::copy(&yaml_src, &yaml_dst).map_err(CocoprepError::io_at(&yaml_src))?;
    } else {
        warn!("{} not found; skipping", yaml_src.display());
    }

    for old in [base.join("images"), base.join("labels")] {
        if old.is_dir() {
            fs::remove_dir_all(&old).map_err(CocoprepError::io_at(&old))?;
        }
    }
    if yaml_src.is_file() {
        fs::remove_file(&yaml_src).map_err(CocoprepError::io_at(&yaml_src))?;
    }

    let entries = fs::read_dir(staging.path()).map_err(CocoprepError::io_at(staging.path()))?;
    for entry in entries {
        let entry = entry.map_err(CocoprepError::io_at(staging.path()))?;
        let dst = base.join(entry.file_name());
        if dst.is_dir() {
            // Left over from an earlier run into the same folder.
            fs::remove_dir_all(&dst).map_err(CocoprepError::io_at(&dst))?;
        }
        fs::rename(entry.path(), &dst).map_err(CocoprepError::io_at(&dst))?;
    }

    info!("restructured {} for Ultralytics", base.display());
    Ok(report)
}

/// Build an RF-DETR tree at `rf_detr_dir` from the COCO split tree at
/// `coco_dir` (`annotations/{train,valid,test}.json` + `{train,val,test}2017/`).
pub fn rf_detr_layout(
    coco_dir: &Path,
    rf_detr_dir: &Path,
) -> Result<Vec<LayoutSplit>, CocoprepError> {
    let mut report = Vec::new();

    for split in Split::ALL {
        let split_dir = rf_detr_dir.join(split.coco_name());
        fs::create_dir_all(&split_dir).map_err(CocoprepError::io_at(&split_dir))?;

        let annotation_src = coco_dir
            .join("annotations")
            .join(format!("{}.json", split.coco_name()));
        let annotations = if annotation_src.is_file() {
            let annotation_dst = split_dir.join(RF_DETR_ANNOTATION_FILE);
            fs::copy(&annotation_src, &annotation_dst)
                .map_err(CocoprepError::io_at(&annotation_src))?;
            true
        } else {
            warn!("annotation file not found: {}", annotation_src.display());
            false
        };

        let images_src = coco_dir.join(format!("{}2017", split.name()));
        let files = if images_src.is_dir() {
            copy_top_level_files(&images_src, &split_dir)?
        } else {
            warn!("images directory not found: {}", images_src.display());
            0
        };

        report.push(LayoutSplit {
            split,
            annotations,
            files,
        });
    }

    info!("RF-DETR dataset structure created at {}", rf_detr_dir.display());
    Ok(report)
}

/// Recursively copy `src` to `dst`, returning the number of files copied.
fn copy_dir(src: &Path, dst: &Path) -> Result<usize, CocoprepError> {
    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|source| CocoprepError::DatasetLayout {
            path: src.to_path_buf(),
            message: format!("failed while traversing directory: {source}"),
        })?;

        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target: PathBuf = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(CocoprepError::io_at(&target))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(CocoprepError::io_at(entry.path()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

fn copy_top_level_files(src: &Path, dst: &Path) -> Result<usize, CocoprepError> {
    let mut copied = 0;

    for entry in WalkDir::new(src).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| CocoprepError::DatasetLayout {
            path: src.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        if entry.file_type().is_file() {
            fs::copy(entry.path(), dst.join(entry.file_name()))
                .map_err(CocoprepError::io_at(entry.path()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

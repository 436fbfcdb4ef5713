//! Per-split exporters.
//!
//! - [`yolo`]: `images/{split}`, `labels/{split}` and a `data.yaml`.
//! - [`coco`]: `annotations/{train,valid,test}.json` and `{split}2017/`.
//!
//! Empty splits are skipped with a warning rather than written as empty
//! directories; the layout stages treat a missing split as optional.

pub mod coco;
pub mod yolo;

pub use coco::{write_coco_splits, CocoExportOptions};
pub use yolo::{write_yolo_splits, YamlSplitPaths, YoloExportOptions};

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::coco::CocoImage;
use crate::dataset::Dataset;
use crate::error::CocoprepError;
use crate::split::Split;

/// What one exporter wrote for one split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitExport {
    pub split: Split,
    pub images: usize,
    pub annotations: usize,
    pub images_copied: usize,
}

/// Copies the source files of `images` into `dest_dir`, keyed by base name.
fn copy_images<'a, I>(dataset: &Dataset, images: I, dest_dir: &Path) -> Result<usize, CocoprepError>
where
    I: IntoIterator<Item = &'a CocoImage>,
{
    fs::create_dir_all(dest_dir).map_err(CocoprepError::io_at(dest_dir))?;

    let mut copied = 0;
    for image in images {
        let src = dataset.existing_image_path(image)?;
        let dst = dest_dir.join(image.base_name());
        fs::copy(&src, &dst).map_err(CocoprepError::io_at(&src))?;
        copied += 1;
    }
    Ok(copied)
}

//! Per-split COCO writer.
//!
//! Each split becomes its own document: the split's images and annotations,
//! the full category list, ids renumbered densely. Category ids follow
//! `category_id_base` so they can line up with the zero-based YOLO class
//! index.

use std::fs;
use std::path::Path;

use log::{info, warn};

use super::{copy_images, SplitExport};
use crate::coco::{write_coco_json, CategoryId, CocoDocument};
use crate::dataset::Dataset;
use crate::error::CocoprepError;
use crate::filter::{filter_document, ID_BASE};
use crate::split::{Split, SplitAssignment};

/// COCO export options.
#[derive(Clone, Debug)]
pub struct CocoExportOptions {
    /// First category id in the written files.
    pub category_id_base: u64,
    /// Copy image files into `{split}2017/`.
    pub copy_images: bool,
}

impl Default for CocoExportOptions {
    fn default() -> Self {
        Self {
            category_id_base: 0,
            copy_images: true,
        }
    }
}

/// Build the standalone document for one split.
pub fn split_document(
    doc: &CocoDocument,
    assignment: &SplitAssignment,
    split: Split,
    category_id_base: u64,
) -> Result<CocoDocument, CocoprepError> {
    let subset = assignment.subset(doc, split);
    let mut renumbered = filter_document(&subset, &subset.category_names())?;

    for cat in &mut renumbered.categories {
        cat.id = rebase(cat.id, category_id_base);
    }
    // Images are copied flat into the split folder.
    for img in &mut renumbered.images {
        img.file_name = img.base_name().to_string();
    }
    for ann in &mut renumbered.annotations {
        ann.category_id = rebase(ann.category_id, category_id_base);
    }
    Ok(renumbered)
}

fn rebase(id: CategoryId, base: u64) -> CategoryId {
    CategoryId::new(id.as_u64() - ID_BASE + base)
}

/// Write `annotations/{train,valid,test}.json` and `{split}2017/` under
/// `coco_dir` for every non-empty split.
pub fn write_coco_splits(
    dataset: &Dataset,
    assignment: &SplitAssignment,
    coco_dir: &Path,
    opts: &CocoExportOptions,
) -> Result<Vec<SplitExport>, CocoprepError> {
    let annotations_dir = coco_dir.join("annotations");
    fs::create_dir_all(&annotations_dir).map_err(CocoprepError::io_at(&annotations_dir))?;

    let mut exports = Vec::new();
    for split in Split::ALL {
        if assignment.images(split).is_empty() {
            warn!("{} split is empty; no COCO files written for it", split.name());
            continue;
        }

        let doc = split_document(&dataset.document, assignment, split, opts.category_id_base)?;
        let json_path = annotations_dir.join(format!("{}.json", split.coco_name()));
        write_coco_json(&json_path, &doc)?;

        let images_copied = if opts.copy_images {
            let images_dir = coco_dir.join(format!("{}2017", split.name()));
            copy_images(dataset, &doc.images, &images_dir)?
        } else {
            0
        };

        info!(
            "COCO {}: {} image(s), {} annotation(s) -> {}",
            split.coco_name(),
            doc.images.len(),
            doc.annotations.len(),
            json_path.display()
        );
        exports.push(SplitExport {
            split,
            images: doc.images.len(),
            annotations: doc.annotations.len(),
            images_copied,
        });
    }

    Ok(exports)
}

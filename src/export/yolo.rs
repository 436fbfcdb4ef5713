//! Ultralytics-style YOLO writer.
//!
//! Writes one label file per image with `class cx cy w h` rows, normalized
//! to the image size, and class indices zero-based in category order.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use super::{copy_images, SplitExport};
use crate::coco::{CategoryId, CocoAnnotation, CocoDocument, CocoImage, ImageId};
use crate::dataset::Dataset;
use crate::error::CocoprepError;
use crate::split::{Split, SplitAssignment};

const LABEL_EXTENSION: &str = "txt";

/// How split paths are written into the yaml file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum YamlSplitPaths {
    /// `images/train`, matching the tree this writer produces.
    #[default]
    ImagesFirst,
    /// `train/images`, matching the tree after the Ultralytics restructure.
    SplitFirst,
}

impl YamlSplitPaths {
    fn path_for(&self, split: Split) -> String {
        match self {
            YamlSplitPaths::ImagesFirst => format!("images/{}", split.name()),
            YamlSplitPaths::SplitFirst => format!("{}/images", split.name()),
        }
    }
}

/// YOLO export options.
#[derive(Clone, Debug)]
pub struct YoloExportOptions {
    /// Name of the dataset yaml written at the output root.
    pub yaml_file: String,
    /// Copy image files next to the labels.
    pub copy_images: bool,
    pub yaml_split_paths: YamlSplitPaths,
}

impl Default for YoloExportOptions {
    fn default() -> Self {
        Self {
            yaml_file: "data.yaml".to_string(),
            copy_images: true,
            yaml_split_paths: YamlSplitPaths::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DataYaml {
    path: String,
    train: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    val: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test: Option<String>,
    nc: usize,
    names: Vec<String>,
}

/// Write every non-empty split of `dataset` as a YOLO tree under `out_dir`.
pub fn write_yolo_splits(
    dataset: &Dataset,
    assignment: &SplitAssignment,
    out_dir: &Path,
    opts: &YoloExportOptions,
) -> Result<Vec<SplitExport>, CocoprepError> {
    let doc = &dataset.document;
    fs::create_dir_all(out_dir).map_err(CocoprepError::io_at(out_dir))?;

    let class_index: BTreeMap<CategoryId, usize> = doc
        .categories
        .iter()
        .enumerate()
        .map(|(idx, cat)| (cat.id, idx))
        .collect();

    let mut by_image: BTreeMap<ImageId, Vec<&CocoAnnotation>> = BTreeMap::new();
    for ann in &doc.annotations {
        by_image.entry(ann.image_id).or_default().push(ann);
    }

    let mut exports = Vec::new();
    for split in Split::ALL {
        let ids = assignment.images(split);
        if ids.is_empty() {
            warn!("{} split is empty; no YOLO files written for it", split.name());
            continue;
        }

        let images: Vec<&CocoImage> = doc
            .images
            .iter()
            .filter(|img| ids.binary_search(&img.id).is_ok())
            .collect();

        let labels_dir = out_dir.join("labels").join(split.name());
        fs::create_dir_all(&labels_dir).map_err(CocoprepError::io_at(&labels_dir))?;

        let mut annotations = 0;
        for image in &images {
            let anns = by_image.get(&image.id).map(Vec::as_slice).unwrap_or_default();
            write_label_file(&labels_dir, image, anns, &class_index)?;
            annotations += anns.len();
        }

        let images_copied = if opts.copy_images {
            copy_images(
                dataset,
                images.iter().copied(),
                &out_dir.join("images").join(split.name()),
            )?
        } else {
            0
        };

        info!(
            "YOLO {}: {} image(s), {} label row(s)",
            split.name(),
            images.len(),
            annotations
        );
        exports.push(SplitExport {
            split,
            images: images.len(),
            annotations,
            images_copied,
        });
    }

    write_data_yaml(&out_dir.join(&opts.yaml_file), doc, assignment, opts)?;
    Ok(exports)
}

fn write_label_file(
    labels_dir: &Path,
    image: &CocoImage,
    anns: &[&CocoAnnotation],
    class_index: &BTreeMap<CategoryId, usize>,
) -> Result<(), CocoprepError> {
    let stem = Path::new(image.base_name()).with_extension(LABEL_EXTENSION);
    let label_path = labels_dir.join(stem);

    let file = fs::File::create(&label_path).map_err(CocoprepError::io_at(&label_path))?;
    let mut writer = BufWriter::new(file);

    for ann in anns {
        let class_id = class_index.get(&ann.category_id).ok_or_else(|| {
            CocoprepError::malformed(
                "annotations.category_id",
                format!(
                    "annotation {} references missing category {}",
                    ann.id, ann.category_id
                ),
            )
        })?;

        let (cx, cy, w, h) = ann.bbox.to_yolo(image.width, image.height);
        writeln!(writer, "{} {:.6} {:.6} {:.6} {:.6}", class_id, cx, cy, w, h)
            .map_err(CocoprepError::io_at(&label_path))?;
    }

    writer.flush().map_err(CocoprepError::io_at(&label_path))
}

fn write_data_yaml(
    path: &Path,
    doc: &CocoDocument,
    assignment: &SplitAssignment,
    opts: &YoloExportOptions,
) -> Result<(), CocoprepError> {
    let split_path = |split: Split| {
        (!assignment.images(split).is_empty()).then(|| opts.yaml_split_paths.path_for(split))
    };

    let data = DataYaml {
        path: ".".to_string(),
        train: opts.yaml_split_paths.path_for(Split::Train),
        val: split_path(Split::Val),
        test: split_path(Split::Test),
        nc: doc.categories.len(),
        names: doc.category_names(),
    };

    let yaml = serde_yaml::to_string(&data).map_err(|source| CocoprepError::YamlWrite {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, yaml).map_err(CocoprepError::io_at(path))
}

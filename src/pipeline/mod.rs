//! End-to-end dataset preparation.
//!
//! Starting from an annotation-tool export (`result.json` + `images/`):
//!
//! 1. filter the COCO document to the requested categories,
//! 2. stage it and import it with its image folder,
//! 3. split into train/val/test,
//! 4. write `yolo/`, `coco/` and `rf_detr/` under the output folder.

use std::fs;
use std::path::PathBuf;

use log::info;
use serde::Serialize;

use crate::coco::read_coco_json;
use crate::dataset::{Dataset, StagedDocument};
use crate::error::CocoprepError;
use crate::export::{
    write_coco_splits, write_yolo_splits, CocoExportOptions, SplitExport, YamlSplitPaths,
    YoloExportOptions,
};
use crate::filter::{expand_category_args, filter_document_with_summary, FilterSummary};
use crate::layout::{rf_detr_layout, ultralytics_layout, LayoutSplit};
use crate::split::{stratified_group_split, SplitAssignment, SplitOptions, SplitRatios};
use crate::stats::{dataset_stats, split_stats, DatasetStats, SplitStats};

/// Options for [`prepare`].
#[derive(Clone, Debug)]
pub struct PrepareOptions {
    /// Folder exported by the annotation tool.
    pub download_folder: PathBuf,
    /// Folder receiving `yolo/`, `coco/` and `rf_detr/`.
    pub output_folder: PathBuf,
    /// Category names to keep. An entry that is not itself a category name
    /// is split on whitespace.
    pub categories: Vec<String>,
    pub ratios: SplitRatios,
    pub seed: Option<u64>,
    pub group_size: usize,
    /// Annotation file inside `download_folder`.
    pub annotations_file: String,
    /// Image folder inside `download_folder`.
    pub images_dir: String,
    /// Dataset yaml written into `yolo/`.
    pub yaml_file: String,
    pub copy_images: bool,
}

impl PrepareOptions {
    pub fn new(
        download_folder: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        categories: Vec<String>,
        ratios: SplitRatios,
    ) -> Self {
        Self {
            download_folder: download_folder.into(),
            output_folder: output_folder.into(),
            categories,
            ratios,
            seed: None,
            group_size: 1,
            annotations_file: "result.json".to_string(),
            images_dir: "images".to_string(),
            yaml_file: "data.yaml".to_string(),
            copy_images: true,
        }
    }
}

/// Everything [`prepare`] produced.
#[derive(Clone, Debug, Serialize)]
pub struct PrepareReport {
    pub filter: FilterSummary,
    pub dataset: DatasetStats,
    pub splits: SplitStats,
    pub assignment: SplitAssignment,
    pub yolo: Vec<SplitExport>,
    pub coco: Vec<SplitExport>,
    pub ultralytics: Vec<LayoutSplit>,
    pub rf_detr: Vec<LayoutSplit>,
}

/// Run the whole preparation pipeline.
///
/// The filtered document lives in a temporary file only for the duration of
/// this call; it is removed whether the pipeline succeeds or fails.
pub fn prepare(opts: &PrepareOptions) -> Result<PrepareReport, CocoprepError> {
    let source_path = opts.download_folder.join(&opts.annotations_file);
    let images_dir = opts.download_folder.join(&opts.images_dir);

    let source = read_coco_json(&source_path)?;
    let categories = expand_category_args(&source, &opts.categories);
    let (filtered, filter) = filter_document_with_summary(&source, &categories)?;
    info!(
        "kept {} of {} annotation(s) for: {}",
        filter.annotations_kept,
        source.annotations.len(),
        categories.join(", ")
    );

    let staged = StagedDocument::stage(&filtered)?;
    let dataset = Dataset::import_staged(&staged, &images_dir)?;
    let stats = dataset_stats(&dataset.document);

    let assignment = stratified_group_split(
        &dataset.document,
        &opts.ratios,
        &SplitOptions {
            seed: opts.seed,
            group_size: opts.group_size,
        },
    )?;
    let splits = split_stats(&dataset.document, &assignment);

    fs::create_dir_all(&opts.output_folder).map_err(CocoprepError::io_at(&opts.output_folder))?;

    let yolo_dir = opts.output_folder.join("yolo");
    let yolo = write_yolo_splits(
        &dataset,
        &assignment,
        &yolo_dir,
        &YoloExportOptions {
            yaml_file: opts.yaml_file.clone(),
            copy_images: opts.copy_images,
            yaml_split_paths: YamlSplitPaths::SplitFirst,
        },
    )?;

    let coco_dir = opts.output_folder.join("coco");
    let coco = write_coco_splits(
        &dataset,
        &assignment,
        &coco_dir,
        &CocoExportOptions {
            copy_images: opts.copy_images,
            ..Default::default()
        },
    )?;

    let ultralytics = ultralytics_layout(&yolo_dir, &opts.yaml_file)?;
    let rf_detr = rf_detr_layout(&coco_dir, &opts.output_folder.join("rf_detr"))?;

    Ok(PrepareReport {
        filter,
        dataset: stats,
        splits,
        assignment,
        yolo,
        coco,
        ultralytics,
        rf_detr,
    })
}

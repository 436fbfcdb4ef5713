#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};

use cocoprep::coco::{CocoAnnotation, CocoBBox, CocoCategory, CocoDocument, CocoImage};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use serde_json::json;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// An annotation described by names instead of ids.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct AnnSem {
    pub image_file: String,
    pub category: String,
    pub bbox: [f64; 4],
}

/// Id-free view of a document's annotations, in document order.
pub fn ann_semantics(doc: &CocoDocument) -> Result<Vec<AnnSem>, String> {
    let image_by_id: BTreeMap<_, _> = doc
        .images
        .iter()
        .map(|img| (img.id, img.file_name.clone()))
        .collect();
    let category_by_id: BTreeMap<_, _> = doc
        .categories
        .iter()
        .map(|cat| (cat.id, cat.name.clone()))
        .collect();

    doc.annotations
        .iter()
        .map(|ann| {
            let image_file = image_by_id.get(&ann.image_id).ok_or_else(|| {
                format!(
                    "annotation {} references missing image_id {}",
                    ann.id, ann.image_id
                )
            })?;
            let category = category_by_id.get(&ann.category_id).ok_or_else(|| {
                format!(
                    "annotation {} references missing category_id {}",
                    ann.id, ann.category_id
                )
            })?;
            Ok(AnnSem {
                image_file: image_file.clone(),
                category: category.clone(),
                bbox: ann.bbox.0,
            })
        })
        .collect()
}

/// A document plus a keep-set drawn from its category names.
pub fn arb_document_and_keep_set(
    max_images: usize,
    max_cats: usize,
    max_anns: usize,
) -> BoxedStrategy<(CocoDocument, Vec<String>)> {
    arb_document(max_images, max_cats, max_anns)
        .prop_flat_map(|doc| {
            let names = doc.category_names();
            let count = names.len();
            (
                Just(doc),
                proptest::collection::vec(any::<bool>(), count..=count),
            )
                .prop_map(move |(doc, picks)| {
                    let keep = names
                        .iter()
                        .zip(picks)
                        .filter(|(_, pick)| *pick)
                        .map(|(name, _)| name.to_string())
                        .collect();
                    (doc, keep)
                })
        })
        .boxed()
}

/// Documents with sparse, unordered ids and populated `info`/`licenses`.
pub fn arb_document(
    max_images: usize,
    max_cats: usize,
    max_anns: usize,
) -> BoxedStrategy<CocoDocument> {
    assert!(max_images > 0, "max_images must be > 0");
    assert!(max_cats > 0, "max_cats must be > 0");

    (1usize..=max_images, 1usize..=max_cats, 0usize..=max_anns)
        .prop_flat_map(|(image_count, category_count, ann_count)| {
            (
                proptest::collection::hash_map(
                    image_file_name_strategy(),
                    (2u32..=4096, 2u32..=4096),
                    image_count..=image_count,
                ),
                proptest::collection::hash_set(
                    category_name_strategy(),
                    category_count..=category_count,
                ),
                proptest::collection::vec(ann_seed_strategy(), ann_count..=ann_count),
                any::<u16>(),
            )
                .prop_map(|(images, categories, ann_seeds, id_offset)| {
                    build_document(images, categories, ann_seeds, id_offset as u64)
                })
        })
        .boxed()
}

type AnnSeed = (u16, u16, u32, u32, u32, u32);

fn ann_seed_strategy() -> impl Strategy<Value = AnnSeed> {
    (
        any::<u16>(),
        any::<u16>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
    )
}

fn image_file_name_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z0-9_]{1,12}\\.jpg")
        .expect("valid filename regex")
        .boxed()
}

fn category_name_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z]{1,20}")
        .expect("valid category name regex")
        .boxed()
}

fn build_document(
    image_data: HashMap<String, (u32, u32)>,
    category_names: HashSet<String>,
    ann_seeds: Vec<AnnSeed>,
    id_offset: u64,
) -> CocoDocument {
    let mut image_rows: Vec<(String, (u32, u32))> = image_data.into_iter().collect();
    image_rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut category_rows: Vec<String> = category_names.into_iter().collect();
    category_rows.sort();

    // Descending, gapped ids so dense renumbering is actually exercised.
    let sparse = |idx: usize, len: usize| id_offset + 3 * (len - idx) as u64;

    let images: Vec<CocoImage> = image_rows
        .iter()
        .enumerate()
        .map(|(idx, (file_name, (width, height)))| {
            CocoImage::new(sparse(idx, image_rows.len()), file_name.clone(), *width, *height)
        })
        .collect();

    let categories: Vec<CocoCategory> = category_rows
        .iter()
        .enumerate()
        .map(|(idx, name)| CocoCategory::new(sparse(idx, category_rows.len()), name.clone()))
        .collect();

    let ann_count = ann_seeds.len();
    let annotations: Vec<CocoAnnotation> = ann_seeds
        .into_iter()
        .enumerate()
        .map(|(idx, (image_seed, category_seed, sx, sy, sw, sh))| {
            let image = &images[image_seed as usize % images.len()];
            let category = &categories[category_seed as usize % categories.len()];
            let bbox = bbox_from_seed(image.width, image.height, sx, sy, sw, sh);

            CocoAnnotation::new(sparse(idx, ann_count), image.id, category.id, bbox)
                .with_area(bbox.area())
                .with_iscrowd(0)
        })
        .collect();

    CocoDocument {
        info: Some(json!({ "description": "generated", "year": 2024 })),
        licenses: Some(json!([{ "id": 1, "name": "CC-BY" }])),
        images,
        categories,
        annotations,
    }
}

fn bbox_from_seed(width: u32, height: u32, sx: u32, sy: u32, sw: u32, sh: u32) -> CocoBBox {
    let x = sx % (width - 1);
    let y = sy % (height - 1);
    let w = 1 + (sw % (width - x));
    let h = 1 + (sh % (height - y));

    CocoBBox::from_xywh(x as f64, y as f64, w as f64, h as f64)
}

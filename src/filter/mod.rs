//! Category filtering and dense re-indexing of COCO documents.
//!
//! Given a document and the category names to keep, [`filter_document`]
//! builds a new, self-consistent document:
//!
//! - `categories` holds exactly the kept categories, in source order, with
//!   ids `1..=k`;
//! - `annotations` holds the annotations of kept categories, in source order,
//!   with ids `1..=n`;
//! - `images` holds the images referenced by a kept annotation, ordered by
//!   their first reference in the kept annotations, with ids `1..=m`;
//! - every `image_id`/`category_id` is rewritten through the new ids;
//! - `info` and `licenses` are copied verbatim.
//!
//! The id assignment order is part of the output contract. Downstream splits
//! and exports are keyed on these ids, so the same input must always
//! produce the same numbering.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use log::{debug, warn};
use serde::Serialize;

use crate::coco::{
    read_coco_json, validate_document, AnnotationId, CategoryId, CocoAnnotation, CocoCategory,
    CocoDocument, CocoImage, DenseIds, ImageId,
};
use crate::error::CocoprepError;

/// First id handed out for categories, images and annotations.
pub const ID_BASE: u64 = 1;

/// Kept/dropped counts from one filter run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub categories_kept: usize,
    pub categories_dropped: usize,
    pub images_kept: usize,
    pub images_dropped: usize,
    pub annotations_kept: usize,
    pub annotations_dropped: usize,
}

impl FilterSummary {
    fn between(input: &CocoDocument, output: &CocoDocument) -> Self {
        Self {
            categories_kept: output.categories.len(),
            categories_dropped: input.categories.len() - output.categories.len(),
            images_kept: output.images.len(),
            images_dropped: input.images.len() - output.images.len(),
            annotations_kept: output.annotations.len(),
            annotations_dropped: input.annotations.len() - output.annotations.len(),
        }
    }

    /// True when nothing survived the filter.
    pub fn is_empty(&self) -> bool {
        self.annotations_kept == 0
    }
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Categories:  {} kept, {} dropped",
            self.categories_kept, self.categories_dropped
        )?;
        writeln!(
            f,
            "Images:      {} kept, {} dropped",
            self.images_kept, self.images_dropped
        )?;
        writeln!(
            f,
            "Annotations: {} kept, {} dropped",
            self.annotations_kept, self.annotations_dropped
        )
    }
}

/// Filters `document` down to the named categories and renumbers it.
///
/// Duplicate names in `category_names` are ignored. An empty name list, or
/// kept categories without annotations, yield a valid document with no
/// images and no annotations.
///
/// # Errors
/// `MalformedInput` when `document` has duplicate ids or names or dangling
/// references. `CategoryNotFound` listing every requested name absent from
/// `document.categories`. No partial result is produced.
///
/// # Example
/// ```
/// use cocoprep::coco::{CocoAnnotation, CocoBBox, CocoCategory, CocoDocument, CocoImage};
/// use cocoprep::filter::filter_document;
///
/// let doc = CocoDocument {
///     images: vec![CocoImage::new(7u64, "a.jpg", 64, 64)],
///     categories: vec![CocoCategory::new(3u64, "cat"), CocoCategory::new(5u64, "dog")],
///     annotations: vec![
///         CocoAnnotation::new(10u64, 7u64, 5u64, CocoBBox::from_xywh(0.0, 0.0, 8.0, 8.0)),
///     ],
///     ..Default::default()
/// };
///
/// let filtered = filter_document(&doc, &["dog".to_string()])?;
/// assert_eq!(filtered.categories[0].id.as_u64(), 1);
/// assert_eq!(filtered.annotations[0].image_id.as_u64(), 1);
/// # Ok::<(), cocoprep::CocoprepError>(())
/// ```
pub fn filter_document(
    document: &CocoDocument,
    category_names: &[String],
) -> Result<CocoDocument, CocoprepError> {
    filter_document_with_summary(document, category_names).map(|(doc, _)| doc)
}

/// Same as [`filter_document`], also returning kept/dropped counts.
pub fn filter_document_with_summary(
    document: &CocoDocument,
    category_names: &[String],
) -> Result<(CocoDocument, FilterSummary), CocoprepError> {
    validate_document(document)?;
    let keep = resolve_categories(document, category_names)?;

    let mut category_ids = DenseIds::starting_at(ID_BASE);
    let mut category_map: HashMap<CategoryId, CategoryId> = HashMap::with_capacity(keep.len());
    let mut categories: Vec<CocoCategory> = Vec::with_capacity(keep.len());

    for cat in document.categories.iter().filter(|cat| keep.contains(&cat.id)) {
        let new_id = CategoryId::new(category_ids.next_id());
        category_map.insert(cat.id, new_id);
        categories.push(CocoCategory {
            id: new_id,
            ..cat.clone()
        });
    }

    let mut image_ids = DenseIds::starting_at(ID_BASE);
    let mut annotation_ids = DenseIds::starting_at(ID_BASE);
    let mut image_map: HashMap<ImageId, ImageId> = HashMap::new();
    let mut image_order: Vec<ImageId> = Vec::new();
    let mut annotations: Vec<CocoAnnotation> = Vec::new();

    for ann in &document.annotations {
        let Some(&category_id) = category_map.get(&ann.category_id) else {
            continue;
        };

        let image_id = *image_map.entry(ann.image_id).or_insert_with(|| {
            image_order.push(ann.image_id);
            ImageId::new(image_ids.next_id())
        });

        annotations.push(CocoAnnotation {
            id: AnnotationId::new(annotation_ids.next_id()),
            image_id,
            category_id,
            ..ann.clone()
        });
    }

    let images_by_id: HashMap<ImageId, &CocoImage> =
        document.images.iter().map(|img| (img.id, img)).collect();

    let images = image_order
        .iter()
        .map(|old_id| {
            let image = images_by_id.get(old_id).ok_or_else(|| {
                CocoprepError::malformed(
                    "annotations.image_id",
                    format!("annotation references missing image {old_id}"),
                )
            })?;
            Ok(CocoImage {
                id: image_map[old_id],
                ..(*image).clone()
            })
        })
        .collect::<Result<Vec<_>, CocoprepError>>()?;

    let output = CocoDocument {
        info: document.info.clone(),
        licenses: document.licenses.clone(),
        images,
        annotations,
        categories,
    };

    let summary = FilterSummary::between(document, &output);
    if summary.is_empty() {
        warn!(
            "category filter kept no annotations (requested: {})",
            category_names.join(", ")
        );
    }
    debug!(
        "filtered {} -> {} annotations over {} image(s)",
        document.annotations.len(),
        summary.annotations_kept,
        summary.images_kept
    );

    Ok((output, summary))
}

/// Reads, validates and filters a COCO JSON file.
pub fn filter_file(
    path: &Path,
    category_names: &[String],
) -> Result<(CocoDocument, FilterSummary), CocoprepError> {
    let document = read_coco_json(path)?;
    filter_document_with_summary(&document, category_names)
}

/// Turns command-line category arguments into category names.
///
/// An argument naming a category of `document` is kept as-is, so names with
/// spaces (`traffic light`) work. Any other argument is split on whitespace,
/// which lets a single `-c "cat dog"` request two categories.
pub fn expand_category_args(document: &CocoDocument, args: &[String]) -> Vec<String> {
    let known: HashSet<&str> = document.categories.iter().map(|c| c.name.as_str()).collect();

    args.iter()
        .flat_map(|arg| {
            if known.contains(arg.as_str()) {
                vec![arg.clone()]
            } else {
                arg.split_whitespace().map(str::to_string).collect()
            }
        })
        .collect()
}

/// Resolves requested names to the source category ids to keep.
fn resolve_categories(
    document: &CocoDocument,
    category_names: &[String],
) -> Result<HashSet<CategoryId>, CocoprepError> {
    let by_name: HashMap<&str, CategoryId> = document
        .categories
        .iter()
        .map(|cat| (cat.name.as_str(), cat.id))
        .collect();

    let mut keep = HashSet::with_capacity(category_names.len());
    let mut missing: Vec<String> = Vec::new();

    for name in category_names {
        match by_name.get(name.as_str()) {
            Some(id) => {
                keep.insert(*id);
            }
            None if !missing.contains(name) => missing.push(name.clone()),
            None => {}
        }
    }

    if !missing.is_empty() {
        return Err(CocoprepError::CategoryNotFound { names: missing });
    }

    Ok(keep)
}

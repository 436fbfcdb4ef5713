//! Structural checks on a parsed COCO document.
//!
//! These run right after parsing so that a broken document fails with the
//! offending field instead of surfacing later as a dangling lookup.

use std::collections::HashSet;

use super::ids::{CategoryId, ImageId};
use super::model::CocoDocument;
use crate::error::CocoprepError;

/// Checks id uniqueness, category name uniqueness and annotation references.
///
/// Returns the first violation found, scanning categories, then images,
/// then annotations.
pub fn validate_document(doc: &CocoDocument) -> Result<(), CocoprepError> {
    let mut category_ids: HashSet<CategoryId> = HashSet::with_capacity(doc.categories.len());
    let mut category_names: HashSet<&str> = HashSet::with_capacity(doc.categories.len());

    for (idx, cat) in doc.categories.iter().enumerate() {
        if !category_ids.insert(cat.id) {
            return Err(CocoprepError::malformed(
                format!("categories[{idx}].id"),
                format!("duplicate category id {}", cat.id),
            ));
        }
        if !category_names.insert(cat.name.as_str()) {
            return Err(CocoprepError::malformed(
                format!("categories[{idx}].name"),
                format!("duplicate category name '{}'", cat.name),
            ));
        }
    }

    let mut image_ids: HashSet<ImageId> = HashSet::with_capacity(doc.images.len());
    for (idx, img) in doc.images.iter().enumerate() {
        if !image_ids.insert(img.id) {
            return Err(CocoprepError::malformed(
                format!("images[{idx}].id"),
                format!("duplicate image id {}", img.id),
            ));
        }
    }

    let mut annotation_ids = HashSet::with_capacity(doc.annotations.len());
    for (idx, ann) in doc.annotations.iter().enumerate() {
        if !annotation_ids.insert(ann.id) {
            return Err(CocoprepError::malformed(
                format!("annotations[{idx}].id"),
                format!("duplicate annotation id {}", ann.id),
            ));
        }
        if !image_ids.contains(&ann.image_id) {
            return Err(CocoprepError::malformed(
                format!("annotations[{idx}].image_id"),
                format!(
                    "annotation {} references missing image {}",
                    ann.id, ann.image_id
                ),
            ));
        }
        if !category_ids.contains(&ann.category_id) {
            return Err(CocoprepError::malformed(
                format!("annotations[{idx}].category_id"),
                format!(
                    "annotation {} references missing category {}",
                    ann.id, ann.category_id
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::{CocoAnnotation, CocoBBox, CocoCategory, CocoImage};

    fn doc() -> CocoDocument {
        CocoDocument {
            images: vec![CocoImage::new(1u64, "a.jpg", 10, 10)],
            categories: vec![CocoCategory::new(1u64, "cat")],
            annotations: vec![CocoAnnotation::new(
                1u64,
                1u64,
                1u64,
                CocoBBox::from_xywh(0.0, 0.0, 1.0, 1.0),
            )],
            ..Default::default()
        }
    }

    fn field_of(err: CocoprepError) -> String {
        match err {
            CocoprepError::MalformedInput { field, .. } => field,
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn accepts_consistent_document() {
        validate_document(&doc()).expect("valid");
    }

    #[test]
    fn rejects_duplicate_image_ids() {
        let mut d = doc();
        d.images.push(CocoImage::new(1u64, "b.jpg", 10, 10));
        assert_eq!(field_of(validate_document(&d).unwrap_err()), "images[1].id");
    }

    #[test]
    fn rejects_duplicate_category_names() {
        let mut d = doc();
        d.categories.push(CocoCategory::new(2u64, "cat"));
        assert_eq!(
            field_of(validate_document(&d).unwrap_err()),
            "categories[1].name"
        );
    }

    #[test]
    fn rejects_dangling_references() {
        let mut d = doc();
        d.annotations[0].image_id = ImageId(5);
        assert_eq!(
            field_of(validate_document(&d).unwrap_err()),
            "annotations[0].image_id"
        );

        let mut d = doc();
        d.annotations[0].category_id = CategoryId(5);
        assert_eq!(
            field_of(validate_document(&d).unwrap_err()),
            "annotations[0].category_id"
        );
    }
}

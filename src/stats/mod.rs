//! Dataset statistics.
//!
//! Counts images, classes and per-class annotations for a document, and the
//! class distribution of each split after splitting.

mod report;

pub use report::{ClassCount, DatasetStats, SplitRow, SplitStats};

use std::collections::HashMap;

use crate::coco::{CategoryId, CocoDocument, ImageId};
use crate::split::{Split, SplitAssignment};

/// Compute image/class/annotation counts for a document.
pub fn dataset_stats(doc: &CocoDocument) -> DatasetStats {
    let counts = count_by_category(doc, |_| true);

    DatasetStats {
        images: doc.images.len(),
        classes: doc.categories.len(),
        annotations: doc.annotations.len(),
        class_counts: doc
            .categories
            .iter()
            .map(|cat| ClassCount {
                name: cat.name.clone(),
                count: counts.get(&cat.id).copied().unwrap_or(0),
            })
            .collect(),
    }
}

/// Compute the class distribution of every split.
pub fn split_stats(doc: &CocoDocument, assignment: &SplitAssignment) -> SplitStats {
    let rows = Split::ALL
        .iter()
        .map(|&split| {
            let members = assignment.images(split);
            let counts = count_by_category(doc, |image_id| members.binary_search(image_id).is_ok());

            SplitRow {
                split,
                images: members.len(),
                annotations: counts.values().sum(),
                class_counts: doc
                    .categories
                    .iter()
                    .map(|cat| counts.get(&cat.id).copied().unwrap_or(0))
                    .collect(),
            }
        })
        .collect();

    SplitStats {
        classes: doc.category_names(),
        rows,
    }
}

fn count_by_category<F>(doc: &CocoDocument, include: F) -> HashMap<CategoryId, usize>
where
    F: Fn(&ImageId) -> bool,
{
    let mut counts: HashMap<CategoryId, usize> = HashMap::new();
    for ann in doc.annotations.iter().filter(|ann| include(&ann.image_id)) {
        *counts.entry(ann.category_id).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coco::{CocoAnnotation, CocoBBox, CocoCategory, CocoImage};

    fn make_doc() -> CocoDocument {
        let bbox = CocoBBox::from_xywh(0.0, 0.0, 5.0, 5.0);
        CocoDocument {
            images: vec![
                CocoImage::new(1u64, "a.jpg", 10, 10),
                CocoImage::new(2u64, "b.jpg", 10, 10),
            ],
            categories: vec![CocoCategory::new(1u64, "dog"), CocoCategory::new(2u64, "bird")],
            annotations: vec![
                CocoAnnotation::new(1u64, 1u64, 1u64, bbox),
                CocoAnnotation::new(2u64, 1u64, 1u64, bbox),
                CocoAnnotation::new(3u64, 2u64, 2u64, bbox),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn counts_per_class_in_category_order() {
        let stats = dataset_stats(&make_doc());
        assert_eq!(stats.images, 2);
        assert_eq!(stats.classes, 2);
        assert_eq!(stats.annotations, 3);
        assert_eq!(
            stats.class_counts,
            vec![
                ClassCount { name: "dog".into(), count: 2 },
                ClassCount { name: "bird".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn display_lists_classes_and_counts() {
        let text = dataset_stats(&make_doc()).to_string();
        assert!(text.contains("Number of images: 2"));
        assert!(text.contains("Number of classes: 2"));
        assert!(text.contains("Classes: dog, bird"));
        assert!(text.contains("  dog   2"));
    }

    #[test]
    fn split_stats_follow_assignment() {
        let doc = make_doc();
        let assignment = SplitAssignment {
            train: vec![ImageId(1)],
            val: vec![ImageId(2)],
            test: vec![],
        };

        let stats = split_stats(&doc, &assignment);
        let train = stats.row(Split::Train).expect("train row");
        assert_eq!(train.images, 1);
        assert_eq!(train.annotations, 2);
        assert_eq!(train.class_counts, vec![2, 0]);

        let val = stats.row(Split::Val).expect("val row");
        assert_eq!(val.class_counts, vec![0, 1]);

        let test = stats.row(Split::Test).expect("test row");
        assert_eq!(test.images, 0);

        let text = stats.to_string();
        assert!(text.lines().next().unwrap().starts_with("split"));
        assert!(text.contains("train"));
    }
}

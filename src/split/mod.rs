//! Stratified group shuffle split into train/val/test.
//!
//! Images are grouped (consecutive images by file name, `group_size` per
//! group), groups are shuffled, and each group is then placed wholesale in
//! the split that still needs the group's rarest class the most. Groups
//! holding rare classes are placed first so that those classes are spread
//! before the common ones fill the splits.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::coco::{CategoryId, CocoDocument, ImageId};
use crate::error::CocoprepError;

const RATIO_TOLERANCE: f64 = 1e-6;
const SCORE_EPSILON: f64 = 1e-9;

/// One of the three dataset splits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    /// Directory name used by the YOLO layout.
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    /// Name used for COCO annotation files and RF-DETR folders.
    pub fn coco_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "valid",
            Split::Test => "test",
        }
    }

    fn index(&self) -> usize {
        match self {
            Split::Train => 0,
            Split::Val => 1,
            Split::Test => 2,
        }
    }
}

/// Target fractions of the dataset per split. Always sums to 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl SplitRatios {
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self, CocoprepError> {
        for (name, value) in [("train", train), ("val", val), ("test", test)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CocoprepError::InvalidSplit {
                    message: format!("{name} fraction {value} is outside [0, 1]"),
                });
            }
        }

        let total = train + val + test;
        if (total - 1.0).abs() > RATIO_TOLERANCE {
            return Err(CocoprepError::InvalidSplit {
                message: format!("fractions must sum to 1.0, got {total}"),
            });
        }

        Ok(Self { train, val, test })
    }

    /// Builds ratios from whole percentages, e.g. `75 10 15`.
    pub fn from_percentages(train: u32, val: u32, test: u32) -> Result<Self, CocoprepError> {
        let total = u64::from(train) + u64::from(val) + u64::from(test);
        if total != 100 {
            return Err(CocoprepError::InvalidSplit {
                message: format!(
                    "percentages must sum to 100, got {train} + {val} + {test} = {total}"
                ),
            });
        }
        Self::new(
            f64::from(train) / 100.0,
            f64::from(val) / 100.0,
            f64::from(test) / 100.0,
        )
    }

    pub fn ratio(&self, split: Split) -> f64 {
        match split {
            Split::Train => self.train,
            Split::Val => self.val,
            Split::Test => self.test,
        }
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            val: 0.1,
            test: 0.1,
        }
    }
}

/// Splitting options.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    /// Seed for the group shuffle. `None` draws a fresh random order.
    pub seed: Option<u64>,
    /// Number of images per indivisible group.
    pub group_size: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            seed: None,
            group_size: 1,
        }
    }
}

/// Image ids per split, each list sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitAssignment {
    pub train: Vec<ImageId>,
    pub val: Vec<ImageId>,
    pub test: Vec<ImageId>,
}

impl SplitAssignment {
    pub fn images(&self, split: Split) -> &[ImageId] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn split_of(&self, image_id: ImageId) -> Option<Split> {
        Split::ALL
            .into_iter()
            .find(|split| self.images(*split).binary_search(&image_id).is_ok())
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The part of `doc` that belongs to `split`, with original ids and the
    /// full category list.
    pub fn subset(&self, doc: &CocoDocument, split: Split) -> CocoDocument {
        let keep: HashSet<ImageId> = self.images(split).iter().copied().collect();

        CocoDocument {
            info: doc.info.clone(),
            licenses: doc.licenses.clone(),
            images: doc
                .images
                .iter()
                .filter(|img| keep.contains(&img.id))
                .cloned()
                .collect(),
            annotations: doc
                .annotations
                .iter()
                .filter(|ann| keep.contains(&ann.image_id))
                .cloned()
                .collect(),
            categories: doc.categories.clone(),
        }
    }

    fn push_group(&mut self, split: Split, group: &Group) {
        let target = match split {
            Split::Train => &mut self.train,
            Split::Val => &mut self.val,
            Split::Test => &mut self.test,
        };
        target.extend_from_slice(&group.images);
    }

    fn sort(&mut self) {
        self.train.sort();
        self.val.sort();
        self.test.sort();
    }
}

/// An indivisible unit of images and the annotations they carry per class.
#[derive(Debug)]
struct Group {
    images: Vec<ImageId>,
    class_counts: BTreeMap<CategoryId, usize>,
}

/// Assign every image of `doc` to exactly one split.
pub fn stratified_group_split(
    doc: &CocoDocument,
    ratios: &SplitRatios,
    opts: &SplitOptions,
) -> Result<SplitAssignment, CocoprepError> {
    if opts.group_size == 0 {
        return Err(CocoprepError::InvalidSplit {
            message: "group size must be greater than 0".to_string(),
        });
    }

    let mut groups = build_groups(doc, opts.group_size);

    if let Some(seed) = opts.seed {
        let mut rng = StdRng::seed_from_u64(seed);
        groups.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        groups.shuffle(&mut rng);
    }

    let mut class_totals: HashMap<CategoryId, usize> = HashMap::new();
    for group in &groups {
        for (cat, count) in &group.class_counts {
            *class_totals.entry(*cat).or_insert(0) += count;
        }
    }

    let rarest = |group: &Group| -> Option<(usize, CategoryId)> {
        group
            .class_counts
            .keys()
            .map(|cat| (class_totals.get(cat).copied().unwrap_or(0), *cat))
            .min()
    };

    // Rarest class first; groups without annotations go last. Stable, so the
    // shuffle still decides order within a rarity level.
    groups.sort_by_key(|group| rarest(group).map_or(usize::MAX, |(total, _)| total));

    let total_images = doc.images.len() as f64;
    let mut assigned_images = [0usize; 3];
    let mut assigned_classes: [HashMap<CategoryId, usize>; 3] = Default::default();
    let mut assignment = SplitAssignment::default();

    for group in &groups {
        let rarest_class = rarest(group);

        // Remaining demand for the group's rarest class in each split.
        let class_deficit = |split: Split| -> f64 {
            let Some((total, cat)) = rarest_class else {
                return 0.0;
            };
            let assigned = assigned_classes[split.index()]
                .get(&cat)
                .copied()
                .unwrap_or(0);
            ratios.ratio(split) * total as f64 - assigned as f64
        };
        let image_deficit = |split: Split| -> f64 {
            ratios.ratio(split) * total_images - assigned_images[split.index()] as f64
        };

        let mut best: Option<(Split, f64, f64)> = None;
        for split in Split::ALL {
            if ratios.ratio(split) <= 0.0 {
                continue;
            }
            let candidate = (split, class_deficit(split), image_deficit(split));
            best = match best {
                None => Some(candidate),
                Some(current) if beats(&candidate, &current) => Some(candidate),
                keep => keep,
            };
        }

        let Some((split, _, _)) = best else {
            continue;
        };

        assignment.push_group(split, group);
        assigned_images[split.index()] += group.images.len();
        for (cat, count) in &group.class_counts {
            *assigned_classes[split.index()].entry(*cat).or_insert(0) += count;
        }
    }

    assignment.sort();
    Ok(assignment)
}

/// Higher demand for the rarest class wins, then higher image demand;
/// earlier splits win exact ties because candidates are visited in order.
fn beats(candidate: &(Split, f64, f64), current: &(Split, f64, f64)) -> bool {
    if (candidate.1 - current.1).abs() > SCORE_EPSILON {
        return candidate.1 > current.1;
    }
    candidate.2 - current.2 > SCORE_EPSILON
}

fn build_groups(doc: &CocoDocument, group_size: usize) -> Vec<Group> {
    let mut ordered: Vec<(&str, ImageId)> = doc
        .images
        .iter()
        .map(|img| (img.file_name.as_str(), img.id))
        .collect();
    ordered.sort();

    let mut per_image: HashMap<ImageId, BTreeMap<CategoryId, usize>> = HashMap::new();
    for ann in &doc.annotations {
        *per_image
            .entry(ann.image_id)
            .or_default()
            .entry(ann.category_id)
            .or_insert(0) += 1;
    }

    ordered
        .chunks(group_size)
        .map(|chunk| {
            let mut class_counts = BTreeMap::new();
            for (_, image_id) in chunk {
                if let Some(counts) = per_image.get(image_id) {
                    for (cat, count) in counts {
                        *class_counts.entry(*cat).or_insert(0) += count;
                    }
                }
            }
            Group {
                images: chunk.iter().map(|(_, id)| *id).collect(),
                class_counts,
            }
        })
        .collect()
}

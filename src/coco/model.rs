//! Typed COCO "instances" schema.
//!
//! Only the fields the pipeline reads are modeled explicitly. Everything else
//! on a record lands in its `extra` map and is written back unchanged, so a
//! filtered document keeps whatever the annotation tool exported.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::bbox::CocoBBox;
use super::ids::{AnnotationId, CategoryId, ImageId};

/// A COCO instances document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CocoDocument {
    /// Opaque dataset metadata. Never inspected or modified.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub info: Option<Value>,

    /// Opaque license list. Never inspected or modified.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub licenses: Option<Value>,

    pub images: Vec<CocoImage>,

    pub annotations: Vec<CocoAnnotation>,

    pub categories: Vec<CocoCategory>,
}

/// Keeps an explicit `null` distinguishable from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl CocoDocument {
    /// Category names in document order.
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|cat| cat.name.clone()).collect()
    }
}

/// An image record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: ImageId,

    pub file_name: String,

    pub width: u32,

    pub height: u32,

    /// Remaining fields (`license`, `date_captured`, tool-specific keys).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CocoImage {
    pub fn new(
        id: impl Into<ImageId>,
        file_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
            extra: Map::new(),
        }
    }

    /// Base name of `file_name`, accepting both `/` and `\` separators.
    ///
    /// Label Studio writes paths such as `images/abc.jpg` or
    /// `images\abc.jpg` depending on the exporting host.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_name)
    }
}

/// A category (class label) record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: CategoryId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CocoCategory {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
            extra: Map::new(),
        }
    }
}

/// An annotation record: one labeled box on one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: AnnotationId,

    pub image_id: ImageId,

    pub category_id: CategoryId,

    pub bbox: CocoBBox,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iscrowd: Option<u8>,

    /// Polygons or RLE. Carried through, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CocoAnnotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: CocoBBox,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
            area: None,
            iscrowd: None,
            segmentation: None,
            extra: Map::new(),
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_iscrowd(mut self, iscrowd: u8) -> Self {
        self.iscrowd = Some(iscrowd);
        self
    }
}

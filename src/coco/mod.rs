//! COCO "instances" documents.
//!
//! Typed records for images, annotations and categories, JSON I/O, and the
//! structural validation every reader applies. `info` and `licenses` are
//! held as raw JSON and passed through untouched.

mod bbox;
mod ids;
mod io;
mod model;
mod validate;

pub(crate) use ids::DenseIds;

pub use bbox::CocoBBox;
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use io::{from_coco_slice, from_coco_str, read_coco_json, to_coco_string, write_coco_json};
pub use model::{CocoAnnotation, CocoCategory, CocoDocument, CocoImage};
pub use validate::validate_document;

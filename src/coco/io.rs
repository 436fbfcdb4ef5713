//! COCO JSON reader and writer.
//!
//! Every reader validates the document before handing it out, so callers
//! never see duplicate ids or dangling references. Writers keep list order
//! as-is: the filter engine defines the order and it is part of its output.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::model::CocoDocument;
use super::validate::validate_document;
use crate::error::CocoprepError;

/// Reads and validates a COCO instances document from disk.
///
/// # Errors
/// `IoAt` if the file cannot be opened, `CocoJsonParse` for invalid JSON,
/// `MalformedInput` for schema violations (missing keys, duplicate ids,
/// dangling references).
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocoprep::coco::read_coco_json;
///
/// let doc = read_coco_json(Path::new("result.json"))?;
/// println!("{} images", doc.images.len());
/// # Ok::<(), cocoprep::CocoprepError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<CocoDocument, CocoprepError> {
    let file = File::open(path).map_err(CocoprepError::io_at(path))?;
    let reader = BufReader::new(file);

    let doc: CocoDocument = serde_json::from_reader(reader).map_err(|source| {
        if source.is_data() {
            schema_error(&source, Some(path))
        } else {
            CocoprepError::CocoJsonParse {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    validate_document(&doc)?;
    Ok(doc)
}

/// Writes a document as pretty-printed COCO JSON.
pub fn write_coco_json(path: &Path, doc: &CocoDocument) -> Result<(), CocoprepError> {
    let file = File::create(path).map_err(CocoprepError::io_at(path))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, doc).map_err(|source| {
        CocoprepError::CocoJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;

    writer.flush().map_err(CocoprepError::io_at(path))
}

/// Parses and validates a document from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoDocument, CocoprepError> {
    let doc: CocoDocument =
        serde_json::from_str(json).map_err(|source| schema_error(&source, None))?;
    validate_document(&doc)?;
    Ok(doc)
}

/// Parses and validates a document from raw bytes.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoDocument, CocoprepError> {
    let doc: CocoDocument =
        serde_json::from_slice(bytes).map_err(|source| schema_error(&source, None))?;
    validate_document(&doc)?;
    Ok(doc)
}

/// Serializes a document to a pretty-printed JSON string.
pub fn to_coco_string(doc: &CocoDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(doc)
}

/// Turns a serde error into `MalformedInput`, naming the field serde
/// complained about when its message carries one (``missing field `images` ``).
fn schema_error(source: &serde_json::Error, path: Option<&Path>) -> CocoprepError {
    let message = source.to_string();
    let field = message
        .split('`')
        .nth(1)
        .map(str::to_string)
        .unwrap_or_else(|| "document".to_string());

    let message = match path {
        Some(path) => format!("{} ({})", message, path.display()),
        None => message,
    };

    CocoprepError::MalformedInput { field, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "info": {"year": 2024, "description": "Label Studio export"},
            "licenses": [{"id": 1, "name": "CC BY 4.0"}],
            "images": [
                {"id": 0, "width": 640, "height": 480, "file_name": "images/001.jpg"}
            ],
            "categories": [
                {"id": 0, "name": "phone"}
            ],
            "annotations": [
                {"id": 0, "image_id": 0, "category_id": 0, "bbox": [10, 20, 90, 60], "area": 5400, "iscrowd": 0, "ignore": 0, "segmentation": []}
            ]
        }"#
    }

    #[test]
    fn parses_label_studio_style_document() {
        let doc = from_coco_str(sample_json()).expect("parse");
        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.images[0].base_name(), "001.jpg");
        assert_eq!(doc.annotations[0].area, Some(5400.0));
        assert_eq!(doc.annotations[0].iscrowd, Some(0));
        assert_eq!(doc.category_names(), vec!["phone"]);
    }

    #[test]
    fn missing_top_level_key_is_malformed() {
        let err = from_coco_str(r#"{"images": [], "annotations": []}"#).unwrap_err();
        match err {
            CocoprepError::MalformedInput { field, .. } => assert_eq!(field, "categories"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_record_field_is_malformed() {
        let err = from_coco_str(
            r#"{"images": [{"id": 1, "width": 1, "height": 1}], "annotations": [], "categories": []}"#,
        )
        .unwrap_err();
        match err {
            CocoprepError::MalformedInput { field, .. } => assert_eq!(field, "file_name"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn file_roundtrip_preserves_document() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("doc.json");

        let doc = from_coco_str(sample_json()).unwrap();
        write_coco_json(&path, &doc).expect("write");
        let back = read_coco_json(&path).expect("read");
        assert_eq!(back, doc);
    }

    #[test]
    fn read_reports_missing_file_with_path() {
        let err = read_coco_json(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, CocoprepError::IoAt { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn read_reports_invalid_json_as_parse_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_coco_json(&path).unwrap_err();
        assert!(matches!(err, CocoprepError::CocoJsonParse { .. }));
    }
}

//! Importing a COCO document together with its image directory.
//!
//! The split and export stages work from a document file on disk plus the
//! folder its images live in. [`StagedDocument`] is the hand-off point for an
//! in-memory document: it serializes to a temporary file that is removed as
//! soon as the stage value is dropped, whether the pipeline succeeds or not.

use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use crate::coco::{read_coco_json, CocoDocument, CocoImage};
use crate::error::CocoprepError;

/// A document serialized to a scoped temporary file.
#[derive(Debug)]
pub struct StagedDocument {
    file: NamedTempFile,
}

impl StagedDocument {
    /// Writes `doc` to a fresh temporary file in the system temp directory.
    pub fn stage(doc: &CocoDocument) -> Result<Self, CocoprepError> {
        let file = tempfile::Builder::new()
            .prefix("cocoprep-")
            .suffix(".json")
            .tempfile()?;
        Self::write(file, doc)
    }

    /// Writes `doc` to a fresh temporary file inside `dir`.
    pub fn stage_in(dir: &Path, doc: &CocoDocument) -> Result<Self, CocoprepError> {
        let file = tempfile::Builder::new()
            .prefix("cocoprep-")
            .suffix(".json")
            .tempfile_in(dir)
            .map_err(CocoprepError::io_at(dir))?;
        Self::write(file, doc)
    }

    fn write(file: NamedTempFile, doc: &CocoDocument) -> Result<Self, CocoprepError> {
        let path = file.path().to_path_buf();
        let mut writer = BufWriter::new(file.as_file());
        serde_json::to_writer(&mut writer, doc).map_err(|source| {
            CocoprepError::CocoJsonWrite {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(CocoprepError::io_at(&path))?;
        drop(writer);

        debug!("staged filtered document at {}", path.display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// A validated COCO document paired with the directory holding its images.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub document: CocoDocument,
    pub annotations_path: PathBuf,
    pub images_dir: PathBuf,
}

impl Dataset {
    /// Reads `annotations_path` and checks that `images_dir` is a directory.
    ///
    /// Image files are looked up lazily by [`Dataset::image_path`]; a
    /// missing file only fails the stage that needs its bytes.
    ///
    /// Exports write images and labels flat, keyed by base name, so two
    /// images sharing a base name or a label stem are `MalformedInput`.
    pub fn import(annotations_path: &Path, images_dir: &Path) -> Result<Self, CocoprepError> {
        if !images_dir.is_dir() {
            return Err(CocoprepError::DatasetLayout {
                path: images_dir.to_path_buf(),
                message: "image directory does not exist".to_string(),
            });
        }

        let document = read_coco_json(annotations_path)?;
        check_flat_names(&document)?;

        Ok(Self {
            document,
            annotations_path: annotations_path.to_path_buf(),
            images_dir: images_dir.to_path_buf(),
        })
    }

    /// Imports a staged document.
    pub fn import_staged(
        staged: &StagedDocument,
        images_dir: &Path,
    ) -> Result<Self, CocoprepError> {
        Self::import(staged.path(), images_dir)
    }

    /// Class names in category order; position is the zero-based class index.
    pub fn class_names(&self) -> Vec<String> {
        self.document.category_names()
    }

    /// Where the bytes of `image` are expected on disk.
    pub fn image_path(&self, image: &CocoImage) -> PathBuf {
        self.images_dir.join(image.base_name())
    }

    /// Like [`Dataset::image_path`], failing when the file is absent.
    pub fn existing_image_path(&self, image: &CocoImage) -> Result<PathBuf, CocoprepError> {
        let path = self.image_path(image);
        if path.is_file() {
            Ok(path)
        } else {
            Err(CocoprepError::MissingImage { path })
        }
    }
}

/// Fails when two images would land on the same flat file or label name.
fn check_flat_names(document: &CocoDocument) -> Result<(), CocoprepError> {
    let mut base_names: HashMap<&str, usize> = HashMap::with_capacity(document.images.len());
    let mut stems: HashMap<&str, usize> = HashMap::with_capacity(document.images.len());

    for (idx, image) in document.images.iter().enumerate() {
        let base = image.base_name();
        if let Some(first) = base_names.insert(base, idx) {
            return Err(CocoprepError::malformed(
                format!("images[{idx}].file_name"),
                format!(
                    "base name '{}' already used by images[{}] ('{}')",
                    base, first, document.images[first].file_name
                ),
            ));
        }

        let stem = Path::new(base)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(base);
        if let Some(first) = stems.insert(stem, idx) {
            return Err(CocoprepError::malformed(
                format!("images[{idx}].file_name"),
                format!(
                    "label name '{}' already used by images[{}] ('{}')",
                    stem, first, document.images[first].file_name
                ),
            ));
        }
    }

    Ok(())
}

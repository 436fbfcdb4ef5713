//! Stats report types and terminal formatting.

use serde::Serialize;
use std::fmt;

use crate::split::Split;

/// Per-class annotation count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub name: String,
    pub count: usize,
}

/// Dataset-level summary: what the importer sees after filtering.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    /// Total number of images.
    pub images: usize,
    /// Total number of categories.
    pub classes: usize,
    /// Total number of annotations.
    pub annotations: usize,
    /// Annotation counts per class, in category order.
    pub class_counts: Vec<ClassCount>,
}

impl DatasetStats {
    pub fn class_names(&self) -> Vec<&str> {
        self.class_counts.iter().map(|c| c.name.as_str()).collect()
    }
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of images: {}", self.images)?;
        writeln!(f, "Number of classes: {}", self.classes)?;
        writeln!(f, "Classes: {}", self.class_names().join(", "))?;
        writeln!(f, "Class counts:")?;

        let width = self
            .class_counts
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0);
        for class in &self.class_counts {
            writeln!(f, "  {:<width$}  {}", class.name, class.count, width = width)?;
        }
        Ok(())
    }
}

/// One split's share of the dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitRow {
    pub split: Split,
    pub images: usize,
    pub annotations: usize,
    /// Annotation counts per class, aligned with [`SplitStats::classes`].
    pub class_counts: Vec<usize>,
}

/// Per-split class distribution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    pub classes: Vec<String>,
    pub rows: Vec<SplitRow>,
}

impl SplitStats {
    pub fn row(&self, split: Split) -> Option<&SplitRow> {
        self.rows.iter().find(|row| row.split == split)
    }
}

impl fmt::Display for SplitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header: Vec<String> = vec!["split".into(), "images".into(), "annotations".into()];
        header.extend(self.classes.iter().cloned());

        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    row.split.name().to_string(),
                    row.images.to_string(),
                    row.annotations.to_string(),
                ];
                cells.extend(row.class_counts.iter().map(usize::to_string));
                cells
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|col| {
                std::iter::once(&header)
                    .chain(rows.iter())
                    .filter_map(|cells| cells.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for cells in std::iter::once(&header).chain(rows.iter()) {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }
}

//! Identifier lists (`<dir>/<dataset>.csv`, column `field_id`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BatchError, Result};

pub const FIELD_COLUMN: &str = "field_id";

#[derive(Debug, Clone)]
pub struct IdentifierCatalog {
    dir: PathBuf,
}

impl IdentifierCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, dataset: &str) -> PathBuf {
        self.dir.join(format!("{dataset}.csv"))
    }

    /// Dataset names (CSV file stems), sorted. A missing directory has none.
    pub fn datasets(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Identifiers of `dataset` in file order.
    ///
    /// A missing file, a file without a `field_id` column, or a column with
    /// no values is an error.
    pub fn load(&self, dataset: &str) -> Result<Vec<String>> {
        if dataset.is_empty() || dataset.contains(['/', '\\']) {
            return Err(BatchError::Catalog(format!(
                "invalid dataset name '{dataset}'"
            )));
        }

        let path = self.path_for(dataset);
        if !path.is_file() {
            return Err(BatchError::NotFound(format!(
                "identifier file {}",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;
        let column = reader
            .headers()?
            .iter()
            .position(|name| name.trim() == FIELD_COLUMN)
            .ok_or_else(|| {
                BatchError::Catalog(format!(
                    "{} has no '{FIELD_COLUMN}' column",
                    path.display()
                ))
            })?;

        let mut identifiers = Vec::new();
        for row in reader.records() {
            let row = row?;
            if let Some(value) = row.get(column).map(str::trim)
                && !value.is_empty()
            {
                identifiers.push(value.to_string());
            }
        }

        if identifiers.is_empty() {
            return Err(BatchError::Catalog(format!(
                "{} lists no identifiers",
                path.display()
            )));
        }
        Ok(identifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_field_ids_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("fundamental6.csv"),
            "field_id,description\nfnd6_at,Assets\n,blank\nfnd6_lt,Liabilities\n",
        )
        .unwrap();

        let catalog = IdentifierCatalog::new(dir.path());
        assert_eq!(
            catalog.load("fundamental6").unwrap(),
            vec!["fnd6_at".to_string(), "fnd6_lt".to_string()]
        );
    }

    #[test]
    fn missing_column_or_values_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "id\nx\n").unwrap();
        fs::write(dir.path().join("b.csv"), "field_id\n").unwrap();

        let catalog = IdentifierCatalog::new(dir.path());
        assert!(matches!(catalog.load("a"), Err(BatchError::Catalog(_))));
        assert!(matches!(catalog.load("b"), Err(BatchError::Catalog(_))));
        assert!(matches!(catalog.load("c"), Err(BatchError::NotFound(_))));
        assert!(catalog.load("../a").is_err());
    }

    #[test]
    fn lists_csv_stems_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pv1.csv"), "field_id\nclose\n").unwrap();
        fs::write(dir.path().join("analyst4.CSV"), "field_id\nx\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let catalog = IdentifierCatalog::new(dir.path());
        assert_eq!(catalog.datasets().unwrap(), vec!["analyst4", "pv1"]);
        assert!(
            IdentifierCatalog::new(dir.path().join("missing"))
                .datasets()
                .unwrap()
                .is_empty()
        );
    }
}

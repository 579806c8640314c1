//! Loads schema documents from a directory into the catalog.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Catalog, CatalogError};
use crate::schema::SchemaDocument;

impl Catalog {
    /// Register every `*.json` schema document in `dir`, in file-name order.
    ///
    /// Returns the number of documents loaded. The first malformed document
    /// aborts the load.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let dir = dir.as_ref();
        let paths = schema_files(dir)?;

        for path in &paths {
            let document = SchemaDocument::from_file(path)?;
            self.register_document(&document)?;
            info!(
                table = %document.qualified_name(),
                columns = document.columns.len(),
                path = %path.display(),
                "Registered schema document"
            );
        }

        info!(dir = %dir.display(), documents = paths.len(), "Loaded schema directory");
        Ok(paths.len())
    }
}

fn schema_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let io_error = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "Skipping non-schema file");
        }
    }
    paths.sort();
    Ok(paths)
}

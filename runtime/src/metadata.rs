// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cookie metadata catalog loaded from a JSON file.
//!
//! The file maps cookie names to `{platform, category, description}`.

use anyhow::{Context, Result};
use cookiecrawler::{CookieDetail, MetadataStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where the catalog is looked for when nothing is configured.
pub const DEFAULT_METADATA_PATH: &str = "translations/en.generated.json";

/// Metadata read from disk once, then served from memory.
#[derive(Debug, Default)]
pub struct JsonMetadataStore {
    entries: HashMap<String, CookieDetail>,
}

impl JsonMetadataStore {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata file {}", path.display()))?;
        let entries: HashMap<String, CookieDetail> = serde_json::from_str(&data)
            .with_context(|| format!("invalid metadata file {}", path.display()))?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "metadata loaded");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataStore for JsonMetadataStore {
    fn lookup(&self, name: &str) -> Option<CookieDetail> {
        self.entries.lookup(name)
    }
}

/// The default catalog location, if a file exists there.
pub fn default_metadata_path() -> Option<PathBuf> {
    let path = PathBuf::from(DEFAULT_METADATA_PATH);
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_and_lookup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"_ga": {{"platform": "Google Analytics", "category": "Analytics", "description": "Distinguishes users"}}}}"#
        )
        .unwrap();

        let store = JsonMetadataStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("_ga").unwrap().platform, "Google Analytics");
        assert!(store.lookup("_gid").is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonMetadataStore::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(JsonMetadataStore::load(file.path()).is_err());
    }
}

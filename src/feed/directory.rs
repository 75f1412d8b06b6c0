use crate::config::SyncConfig;
use crate::domain::{Category, RawRow};
use crate::errors::ConfigError;
use crate::feed::{parse_csv, FeedError, FeedSource};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Reads category datasets from a local copy of a release.
pub struct DirectoryFeed {
    dir: PathBuf,
    files: BTreeMap<Category, String>,
}

impl DirectoryFeed {
    pub fn new(dir: impl Into<PathBuf>, config: &SyncConfig) -> Self {
        Self {
            dir: dir.into(),
            files: config.categories.iter().cloned().collect(),
        }
    }
}

impl FeedSource for DirectoryFeed {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn fetch(&self, category: Category) -> Result<Vec<RawRow>, FeedError> {
        let file = self
            .files
            .get(&category)
            .ok_or_else(|| ConfigError::UnknownCategory(category.to_string()))?;
        let path = self.dir.join(file);
        let reader = File::open(&path).map_err(|source| FeedError::Io { path, source })?;
        parse_csv(BufReader::new(reader))
    }
}

use crate::config::SyncConfig;
use crate::domain::Category;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway workspace: a release directory, a database and a report directory.
pub struct Workspace {
    pub root: TempDir,
    pub config: SyncConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
        let config = SyncConfig {
            db_path: root.path().join("data/mp_earnings.db"),
            output_dir: root.path().join("outputs"),
            ..SyncConfig::default()
        };
        Self { root, config }
    }

    pub fn release_dir(&self) -> PathBuf {
        self.root.path().join("release")
    }

    /// Publishes `csv` as the category's dataset in the release directory.
    pub fn publish(&self, category: Category, csv: &str) {
        let dir = self.release_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(category.default_file()), csv).unwrap();
    }

    pub fn unpublish(&self, category: Category) {
        let _ = fs::remove_file(self.release_dir().join(category.default_file()));
    }
}

pub fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 9, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

// config.rs
use crate::domain::{Category, FieldPolicy};
use crate::errors::ConfigError;
use clap::ValueEnum;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str =
    "https://pages.mysociety.org/parl_register_interests/data/commons_rmfi/latest";

/// File type the report exporter writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One CSV file per report.
    Csv,
    /// A single workbook with a worksheet per report.
    Xlsx,
}

/// Everything a run needs, built once in `main` and handed to each component.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: String,
    /// Categories to fetch, in order, with their published file names.
    pub categories: Vec<(Category, String)>,
    pub db_path: PathBuf,
    pub output_dir: PathBuf,
    /// Categories that get a full dump in the reports.
    pub report_categories: Vec<Category>,
    pub top_members_limit: usize,
    pub recent_changes_limit: usize,
    pub report_format: ReportFormat,
    pub request_timeout: Duration,
    pub max_fetch_attempts: u32,
    pub field_policy: FieldPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            categories: Category::ALL
                .iter()
                .map(|c| (*c, c.default_file().to_string()))
                .collect(),
            db_path: PathBuf::from("data/mp_earnings.db"),
            output_dir: PathBuf::from("outputs"),
            report_categories: vec![
                Category::AdHocPayments,
                Category::OngoingEmployment,
                Category::Donations,
                Category::GiftsUk,
            ],
            top_members_limit: 50,
            recent_changes_limit: 500,
            report_format: ReportFormat::Csv,
            request_timeout: Duration::from_secs(60),
            max_fetch_attempts: 3,
            field_policy: FieldPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Parsed base URL, always ending in `/` so file names join under it.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|source| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    pub fn file_for(&self, category: Category) -> Option<&str> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, file)| file.as_str())
    }

    pub fn category_list(&self) -> Vec<Category> {
        self.categories.iter().map(|(c, _)| *c).collect()
    }

    /// Where `category` is published.
    pub fn category_url(&self, category: Category) -> Result<Url, ConfigError> {
        let file = self
            .file_for(category)
            .ok_or_else(|| ConfigError::UnknownCategory(category.to_string()))?;
        self.base_url()?
            .join(file)
            .map_err(|source| ConfigError::BaseUrl {
                url: self.base_url.clone(),
                source,
            })
    }

    /// Creates the database directory and the report directory.
    pub fn setup_directories(&self) -> io::Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.output_dir)
    }
}

mod client;
mod csv_rows;
mod directory;
mod feed_error;

pub use client::HttpFeed;
pub use csv_rows::parse_csv;
pub use directory::DirectoryFeed;
pub use feed_error::FeedError;

use crate::domain::{Category, Datasets, RawRow};
use tracing::{info, warn};

/// Somewhere category datasets can be read from.
pub trait FeedSource {
    /// Origin recorded in the run history.
    fn describe(&self) -> String;
    fn fetch(&self, category: Category) -> Result<Vec<RawRow>, FeedError>;
}

/// Result of fetching every category of a run.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Categories that returned at least one row.
    pub datasets: Datasets,
    /// Categories that could not be fetched; treated as empty this run.
    pub failures: Vec<(Category, FeedError)>,
}

impl FetchOutcome {
    pub fn failed_categories(&self) -> Vec<String> {
        self.failures.iter().map(|(c, _)| c.to_string()).collect()
    }
}

/// Fetches each category in turn. A failing category is logged and recorded
/// but never stops the others.
pub fn fetch_all<S>(source: &S, categories: &[Category]) -> FetchOutcome
where
    S: FeedSource + ?Sized,
{
    let mut outcome = FetchOutcome::default();
    for &category in categories {
        match source.fetch(category) {
            Ok(rows) if rows.is_empty() => {
                info!(%category, "no records published");
            }
            Ok(rows) => {
                info!(%category, records = rows.len(), "fetched");
                outcome.datasets.insert(category, rows);
            }
            Err(e) => {
                warn!(%category, error = %e, "fetch failed, treating category as empty");
                outcome.failures.push((category, e));
            }
        }
    }
    outcome
}

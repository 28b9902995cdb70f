//! Discovery of baked result files on local disk.
//!
//! Result files are named `<date>__<jurisdiction>__<anything>[__raw].<ext>`, where
//! `<date>` is an 8-digit `YYYYMMDD` date and `<ext>` is `csv` or `json`. The locator
//! turns a jurisdiction plus optional filters into glob patterns and returns the
//! matching paths.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extensions searched for, in order.
pub const RESULT_EXTENSIONS: [&str; 2] = [".csv", ".json"];

/// Filename segment marking a raw (unprocessed) result file.
pub const RAW_MARKER: &str = "raw";

/// Directory under the country root where result files are staged.
pub const BAKERY_DIR: &str = "bakery";

const SEGMENT_SEPARATOR: &str = "__";

/// Filters selecting which result files to look for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    /// Jurisdiction code, e.g. `ny`. Matched as given.
    pub jurisdiction: String,
    /// Prefix of a `YYYYMMDD` date, e.g. `2014` or `201411`.
    pub date_filter: Option<String>,
    /// Look for raw files instead of cleaned ones.
    pub raw: bool,
    /// Overrides the locator's default search directory.
    pub search_dir: Option<PathBuf>,
}

impl FileQuery {
    pub fn new(jurisdiction: impl Into<String>) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            ..Self::default()
        }
    }

    pub fn date_filter(mut self, date_filter: impl Into<String>) -> Self {
        self.date_filter = Some(date_filter.into());
        self
    }

    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn search_dir(mut self, search_dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(search_dir.into());
        self
    }
}

/// Finds result files under a results directory.
#[derive(Debug, Clone)]
pub struct FileLocator {
    results_dir: PathBuf,
}

impl FileLocator {
    /// Locator searching `<country_dir>/bakery` by default.
    pub fn new(country_dir: impl AsRef<Path>) -> Self {
        Self {
            results_dir: results_dir(country_dir),
        }
    }

    /// Locator searching `results_dir` directly.
    pub fn with_results_dir(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Paths of every result file matching `query`.
    ///
    /// Never fails: an unreadable or missing directory, or a jurisdiction that
    /// does not form a valid pattern, yields no matches.
    pub fn get_filenames(&self, query: &FileQuery) -> Vec<PathBuf> {
        let search_dir = query.search_dir.as_deref().unwrap_or(self.results_dir.as_path());
        let mut filenames = Vec::new();

        for ext in RESULT_EXTENSIONS {
            let file_pattern = build_pattern(
                &query.jurisdiction,
                ext,
                query.date_filter.as_deref(),
                query.raw,
            );
            let pattern = format!(
                "{}/{}",
                glob::Pattern::escape(&search_dir.to_string_lossy()),
                file_pattern
            );
            debug!(pattern = %pattern, "Searching for result files");

            let paths = match glob::glob(&pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(error = %e, pattern = %pattern, "Invalid result file pattern");
                    continue;
                }
            };
            for entry in paths {
                match entry {
                    Ok(path) => filenames.push(path),
                    Err(e) => warn!(error = %e, "Skipping unreadable path while searching"),
                }
            }
        }

        info!(
            jurisdiction = %query.jurisdiction,
            search_dir = %search_dir.display(),
            count = filenames.len(),
            "Located result files"
        );
        filenames
    }
}

/// `<country_dir>/bakery`.
pub fn results_dir(country_dir: impl AsRef<Path>) -> PathBuf {
    country_dir.as_ref().join(BAKERY_DIR)
}

/// Filename glob for one extension, e.g. `2014*__ny__*__raw.csv`.
///
/// Date filters shorter than six characters (a year, say) get a trailing `*`;
/// no filter matches any date.
pub fn build_pattern(jurisdiction: &str, ext: &str, date_filter: Option<&str>, raw: bool) -> String {
    let date_segment = match date_filter.filter(|d| !d.is_empty()) {
        Some(d) if d.len() < 6 => format!("{d}*"),
        Some(d) => d.to_string(),
        None => "*".to_string(),
    };

    let mut segments = vec![date_segment.as_str(), jurisdiction, "*"];
    if raw {
        segments.push(RAW_MARKER);
    }

    segments.join(SEGMENT_SEPARATOR) + ext
}

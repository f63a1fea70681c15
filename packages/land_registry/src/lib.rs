#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Downloader for HM Land Registry price-paid data.
//!
//! The registry publishes each year as `pp-{year}-part{n}.csv` objects in a
//! public bucket. Files are fetched one at a time and written unchanged;
//! parsing happens later when the store loads them.

use std::path::{Path, PathBuf};

use housing_map_config::LandRegistryConfig;
use thiserror::Error;

/// Errors that can occur while downloading price-paid data.
#[derive(Debug, Error)]
pub enum LandRegistryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A downloaded file could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One published price-paid file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePaidFile {
    /// Calendar year of the transactions.
    pub year: i32,
    /// 1-based part number within the year.
    pub part: u32,
    /// Download URL.
    pub url: String,
}

impl PricePaidFile {
    /// File name the registry uses for this part.
    #[must_use]
    pub fn file_name(&self) -> String {
        file_name(self.year, self.part)
    }
}

fn file_name(year: i32, part: u32) -> String {
    format!("pp-{year}-part{part}.csv")
}

/// Every file for `start_year..end_year` (end exclusive), parts `1..=parts`
/// within each year.
#[must_use]
pub fn price_paid_urls(
    base_url: &str,
    start_year: i32,
    end_year: i32,
    parts: u32,
) -> Vec<PricePaidFile> {
    let base = base_url.trim_end_matches('/');

    (start_year..end_year)
        .flat_map(|year| {
            (1..=parts).map(move |part| PricePaidFile {
                year,
                part,
                url: format!("{base}/{}", file_name(year, part)),
            })
        })
        .collect()
}

/// Downloads the price-paid files for `start_year..end_year` into
/// `dest_dir`, creating it if needed.
///
/// Responses other than `200 OK` are logged and skipped. Returns the paths
/// of the files written, in year then part order.
///
/// # Errors
///
/// Returns [`LandRegistryError`] if a request cannot be sent, a body cannot
/// be read, or a file cannot be written.
pub async fn download_price_paid_data(
    client: &reqwest::Client,
    config: &LandRegistryConfig,
    start_year: i32,
    end_year: i32,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>, LandRegistryError> {
    let files = price_paid_urls(&config.base_url, start_year, end_year, config.parts_per_year);
    if files.is_empty() {
        log::warn!("No price-paid files for years {start_year}..{end_year}");
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(dest_dir).await?;
    log::info!(
        "Downloading {} price-paid files into {}",
        files.len(),
        dest_dir.display()
    );

    let mut written = Vec::with_capacity(files.len());

    for file in &files {
        let resp = client.get(&file.url).send().await?;
        if resp.status() != reqwest::StatusCode::OK {
            log::warn!("{} returned {}, skipping", file.url, resp.status());
            continue;
        }

        let bytes = resp.bytes().await?;
        let path = dest_dir.join(file.file_name());
        tokio::fs::write(&path, &bytes).await?;

        log::info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }

    log::info!(
        "Files downloaded: {} of {}",
        written.len(),
        files.len()
    );

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://prod.publicdata.landregistry.gov.uk.s3-website-eu-west-1.amazonaws.com";

    #[test]
    fn urls_cover_each_year_and_part() {
        let files = price_paid_urls(BASE, 2020, 2022, 2);
        let urls: Vec<&str> = files.iter().map(|f| f.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                format!("{BASE}/pp-2020-part1.csv"),
                format!("{BASE}/pp-2020-part2.csv"),
                format!("{BASE}/pp-2021-part1.csv"),
                format!("{BASE}/pp-2021-part2.csv"),
            ]
        );
        assert_eq!(files[3].year, 2021);
        assert_eq!(files[3].part, 2);
    }

    #[test]
    fn end_year_is_exclusive() {
        assert!(price_paid_urls(BASE, 2021, 2021, 2).is_empty());
        assert_eq!(price_paid_urls(BASE, 2021, 2022, 1).len(), 1);
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let files = price_paid_urls("http://example.test/", 1995, 1996, 1);
        assert_eq!(files[0].url, "http://example.test/pp-1995-part1.csv");
        assert_eq!(files[0].file_name(), "pp-1995-part1.csv");
    }

    #[tokio::test]
    async fn empty_range_downloads_nothing() {
        let config = LandRegistryConfig {
            base_url: BASE.to_string(),
            parts_per_year: 2,
            download_dir: PathBuf::from("unused"),
        };
        let dest = std::env::temp_dir().join("housing_map_never_created");

        let written = download_price_paid_data(&reqwest::Client::new(), &config, 2024, 2020, &dest)
            .await
            .unwrap();

        assert!(written.is_empty());
        assert!(!dest.exists());
    }
}

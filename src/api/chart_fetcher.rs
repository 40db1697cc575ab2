use tracing::{info, warn};

use super::steam_api::SteamApiSource;
use super::steam_charts::SteamChartsSource;
use super::ChartSource;
use crate::charts::formatter;

pub const UNAVAILABLE_LINE: &str = "Unable to load Steam charts";

/// Tries each source in order and formats the first non-empty result.
/// The first source is the authoritative one; later ones are degraded-mode
/// fallbacks and are only consulted when everything before them failed.
pub struct ChartFetcher {
    sources: Vec<Box<dyn ChartSource>>,
}

impl ChartFetcher {
    pub fn new(sources: Vec<Box<dyn ChartSource>>) -> Self {
        Self { sources }
    }

    pub fn steam(client: reqwest::Client, api_url: &str, charts_url: &str) -> Self {
        Self::new(vec![
            Box::new(SteamApiSource::new(client.clone(), api_url)),
            Box::new(SteamChartsSource::new(client, charts_url)),
        ])
    }

    /// Never fails: total failure yields the single unavailable line.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn fetch_top_lines(&self) -> Vec<String> {
        for source in &self.sources {
            match source.fetch().await {
                Ok(records) if !records.is_empty() => {
                    info!(
                        source = source.name(),
                        count = records.len(),
                        "Loaded chart entries"
                    );
                    return records.iter().map(formatter::format_record).collect();
                }
                Ok(_) => warn!(source = source.name(), "Chart source returned no entries"),
                Err(e) => warn!(source = source.name(), error = %e, "Chart source failed"),
            }
        }

        warn!("All chart sources failed, showing placeholder");
        vec![UNAVAILABLE_LINE.to_string()]
    }
}

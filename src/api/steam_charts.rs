use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::USER_AGENT;
use tracing::{debug, info};

use super::{ChartSource, RankedRecord, SourceError, TOP_N};

pub const TOP_GAMES_URL: &str = "https://steamcharts.com/top";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

// rank cell, then the game link, then the first numeric cell (current players)
static ROW_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<tr[^>]*>\s*<td[^>]*>\s*(\d+).*?<a href="/app/\d+">([^<]+)</a>.*?<td class="num">([\d,]+)</td>"#,
    )
    .unwrap()
});

/// Scrapes the steamcharts.com top list. Degraded-mode source: it depends on
/// third-party markup, so a layout change surfaces as [`SourceError::NoData`].
pub struct SteamChartsSource {
    client: reqwest::Client,
    url: String,
}

impl SteamChartsSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChartSource for SteamChartsSource {
    fn name(&self) -> &'static str {
        "steam_charts"
    }

    #[tracing::instrument(level = "trace", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<RankedRecord>, SourceError> {
        let html = self
            .client
            .get(&self.url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .text()
            .await?;

        debug!(bytes = html.len(), "Fetched steamcharts top page");

        let records = parse_top_rows(&html);
        info!(count = records.len(), "Extracted rows from steamcharts");

        if records.is_empty() {
            return Err(SourceError::NoData);
        }
        Ok(records)
    }
}

/// Rows come back in document order, which the page keeps in rank order.
pub fn parse_top_rows(html: &str) -> Vec<RankedRecord> {
    ROW_REGEX
        .captures_iter(html)
        .filter_map(|caps| {
            let rank = caps[1].parse::<u32>().ok()?;
            let name = html_escape::decode_html_entities(caps[2].trim()).into_owned();
            let count = caps[3].replace(',', "").parse::<u64>().ok()?;
            Some(RankedRecord { rank, name, count })
        })
        .take(TOP_N)
        .collect()
}

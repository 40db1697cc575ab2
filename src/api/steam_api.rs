use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{ChartSource, RankedRecord, SourceError, TOP_N};
use crate::fmt;

pub const MOST_PLAYED_URL: &str =
    "https://api.steampowered.com/ISteamChartsService/GetMostPlayedGames/v1/";

#[derive(Debug, Deserialize)]
struct MostPlayedEnvelope {
    response: Option<MostPlayedResponse>,
}

#[derive(Debug, Deserialize)]
struct MostPlayedResponse {
    ranks: Option<Vec<ApiRank>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRank {
    pub rank: Option<u32>,
    pub appid: Option<u64>,
    pub name: Option<String>,
    pub app_name: Option<String>,
    pub concurrent_in_game: Option<u64>,
    pub peak_in_game: Option<u64>,
}

/// Valve's charts service. Undocumented, but structured and authoritative.
pub struct SteamApiSource {
    client: reqwest::Client,
    url: String,
}

impl SteamApiSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChartSource for SteamApiSource {
    fn name(&self) -> &'static str {
        "steam_api"
    }

    #[tracing::instrument(level = "trace", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<RankedRecord>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;

        let envelope = response.json::<MostPlayedEnvelope>().await?;
        let ranks = envelope
            .response
            .and_then(|r| r.ranks)
            .ok_or(SourceError::MissingRanking)?;

        info!(count = ranks.len(), "Fetched most played ranking from Steam");

        let records = to_records(&ranks);
        if records.is_empty() {
            return Err(SourceError::NoData);
        }
        Ok(records)
    }
}

fn to_records(ranks: &[ApiRank]) -> Vec<RankedRecord> {
    ranks
        .iter()
        .take(TOP_N)
        .enumerate()
        .map(|(idx, entry)| to_record(idx, entry))
        .collect()
}

/// Missing fields are synthesized: rank from the 1-based position, name from
/// the app id (or `Unknown app` when there is none), count as 0.
pub fn to_record(position: usize, entry: &ApiRank) -> RankedRecord {
    let rank = entry
        .rank
        .filter(|r| *r > 0)
        .unwrap_or(position as u32 + 1);

    let name = [&entry.name, &entry.app_name]
        .into_iter()
        .flatten()
        .map(|n| n.trim())
        .find(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match entry.appid {
            Some(appid) => fmt!("App {appid}"),
            None => "Unknown app".to_string(),
        });

    let count = [entry.concurrent_in_game, entry.peak_in_game]
        .into_iter()
        .flatten()
        .find(|c| *c > 0)
        .unwrap_or(0);

    RankedRecord { rank, name, count }
}

use async_trait::async_trait;

pub(crate) mod chart_fetcher;
pub(crate) mod steam_api;
pub(crate) mod steam_charts;

/// Number of entries kept from any single fetch.
pub const TOP_N: usize = 5;

/// One entry of a most-played listing, in source rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRecord {
    pub rank: u32,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response has no ranking array")]
    MissingRanking,

    #[error("source returned no entries")]
    NoData,
}

/// A source of ranked records. Implementations return at most [`TOP_N`]
/// records and report an empty listing as [`SourceError::NoData`].
#[async_trait]
pub trait ChartSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<RankedRecord>, SourceError>;
}

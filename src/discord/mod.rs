use async_trait::async_trait;

use crate::Error;

mod presence;

pub use presence::DiscordPresence;

/// Where display lines end up. Callers treat every failure as non-fatal.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status_line(&self, line: &str) -> Result<(), Error>;

    async fn set_display_name(&self, name: &str) -> Result<(), Error>;
}

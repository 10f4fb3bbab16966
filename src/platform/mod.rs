pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// Outbound side of a chat platform: deliver text to one destination.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Platform identifier (e.g., "telegram")
    fn platform(&self) -> &'static str;

    async fn send_text(&self, text: &str) -> Result<()>;
}

//! Page fetcher port - resolves outer pages into the embedded game address.

use async_trait::async_trait;

use crate::domain::errors::SessionResult;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Download the HTML of `url`.
    async fn fetch(&self, url: &str) -> SessionResult<String>;

    /// Address of the frame embedded in `html`, relative sources resolved against `base`.
    fn extract_frame_src(&self, html: &str, base: &str) -> SessionResult<String>;

    /// Fetch `url` and return the address of the game frame it embeds.
    async fn resolve_frame(&self, url: &str) -> SessionResult<String> {
        let html = self.fetch(url).await?;
        self.extract_frame_src(&html, url)
    }
}

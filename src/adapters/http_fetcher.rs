//! Outer-page fetcher for games embedded behind an iframe.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::ports::PageFetcher;

static IFRAME_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<iframe\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
        .expect("iframe pattern is valid")
});

/// `src` of the first iframe in `html`, resolved against `base`.
pub fn extract_frame_src(html: &str, base: &str) -> SessionResult<String> {
    let src = IFRAME_SRC
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().replace("&amp;", "&"))
        .ok_or_else(|| SessionError::Resolution(format!("no game frame found on {base}")))?;

    let base = Url::parse(base)
        .map_err(|err| SessionError::Resolution(format!("invalid page address {base}: {err}")))?;
    base.join(&src)
        .map(String::from)
        .map_err(|err| SessionError::Resolution(format!("invalid frame address {src}: {err}")))
}

/// Fetches pages with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> SessionResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SessionError::Resolution(format!("failed to build http client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> SessionResult<String> {
        debug!(%url, "fetching outer page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| SessionError::Resolution(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Resolution(format!("{url} answered {status}")));
        }

        response
            .text()
            .await
            .map_err(|err| SessionError::Resolution(format!("unreadable page at {url}: {err}")))
    }

    fn extract_frame_src(&self, html: &str, base: &str) -> SessionResult<String> {
        extract_frame_src(html, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_relative_frame_is_joined() {
        let html = r#"<html><body><IFRAME id="game" class="x" src="/play/launch?game=dragons&amp;mode=demo"></IFRAME></body></html>"#;
        let src = extract_frame_src(html, "https://casino.example/slots/dragons").unwrap();
        assert_eq!(src, "https://casino.example/play/launch?game=dragons&mode=demo");
    }

    #[test]
    fn test_absolute_frame_kept() {
        let html = "<iframe src='https://cdn.example/g/index.html'></iframe>";
        let src = extract_frame_src(html, "https://casino.example/").unwrap();
        assert_eq!(src, "https://cdn.example/g/index.html");
    }

    #[test]
    fn test_page_without_frame() {
        let err = extract_frame_src("<div>maintenance</div>", "https://casino.example/").unwrap_err();
        assert!(matches!(err, SessionError::Resolution(_)));
    }

    #[tokio::test]
    async fn test_resolve_frame_over_http() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/slots/dragons")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<iframe width="100%" src="frame/index.html?id=7"></iframe>"#)
            .create_async()
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5)).unwrap();
        let page = format!("{}/slots/dragons", server.url());
        let frame = fetcher.resolve_frame(&page).await.unwrap();

        assert_eq!(frame, format!("{}/slots/frame/index.html?id=7", server.url()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_resolution_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/gone")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&format!("{}/gone", server.url())).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}

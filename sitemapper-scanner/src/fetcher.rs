use crate::error::{Result, ScanError};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Sitemapper/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/trapdoorsec/sitemapper)"
);

/// Retrieves the text of one sitemap document.
///
/// The crawler only ever awaits one fetch at a time, so implementations do
/// not need to be cheap to call concurrently.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// `Fetch` over HTTP(S). Non-2xx responses are errors; bodies are decoded
/// with the response charset, falling back to UTF-8.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::with_options(timeout_secs, DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status { status });
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

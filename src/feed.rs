use crate::data_structures::FeedEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rand::seq::IndexedRandom;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_FEED_URL_TEMPLATE: &str = "https://finance.yahoo.com/rss/headline?s={ticker}";
pub const TICKER_PLACEHOLDER: &str = "{ticker}";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15",
];

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed endpoint returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("feed could not be parsed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    #[error("feed URL template must contain {{ticker}}: {0}")]
    InvalidTemplate(String),
}

/// Entries parsed from one feed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedBatch {
    pub entries: Vec<FeedEntry>,
    /// Items dropped because they carried no summary text.
    pub skipped: usize,
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, ticker: &str) -> Result<FeedBatch, FeedError>;
}

pub struct RssFeedClient {
    client: Client,
    url_template: String,
    random_agent: bool,
    display_timezone: Tz,
}

impl RssFeedClient {
    pub fn new(
        url_template: impl Into<String>,
        timeout: Duration,
        random_agent: bool,
        display_timezone: Tz,
    ) -> Result<Self, FeedError> {
        let url_template = url_template.into();
        if !url_template.contains(TICKER_PLACEHOLDER) {
            return Err(FeedError::InvalidTemplate(url_template));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url_template,
            random_agent,
            display_timezone,
        })
    }

    pub fn feed_url(&self, ticker: &str) -> String {
        self.url_template.replace(TICKER_PLACEHOLDER, ticker)
    }

    fn user_agent(&self) -> &'static str {
        if self.random_agent {
            USER_AGENTS.choose(&mut rand::rng()).copied().unwrap_or(USER_AGENTS[0])
        } else {
            USER_AGENTS[0]
        }
    }
}

#[async_trait]
impl FeedSource for RssFeedClient {
    #[instrument(skip(self), fields(url))]
    async fn fetch_feed(&self, ticker: &str) -> Result<FeedBatch, FeedError> {
        let url = self.feed_url(ticker);
        tracing::Span::current().record("url", url.as_str());
        debug!("Requesting news feed");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8")
            .header("User-Agent", self.user_agent())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Feed endpoint responded with error status");
            return Err(FeedError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let batch = parse_feed(&body, &self.display_timezone)?;
        debug!(entries = batch.entries.len(), skipped = batch.skipped, "Parsed news feed");
        Ok(batch)
    }
}

/// Parses an RSS or Atom document into feed entries, preserving source order.
pub fn parse_feed(body: &[u8], display_timezone: &Tz) -> Result<FeedBatch, FeedError> {
    let feed = feed_rs::parser::parse(body)?;
    let mut batch = FeedBatch::default();

    for entry in feed.entries {
        let title = entry.title.map(|t| t.content).unwrap_or_default();

        let summary = entry
            .summary
            .map(|s| s.content)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content.and_then(|c| c.body));

        let summary = match summary {
            Some(summary) if !summary.trim().is_empty() => summary,
            _ => {
                warn!(title = %title, "Skipping feed entry without summary");
                batch.skipped += 1;
                continue;
            }
        };

        let link = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();
        let published = entry
            .published
            .or(entry.updated)
            .map(|ts| format_published(ts, display_timezone))
            .unwrap_or_default();

        batch.entries.push(FeedEntry {
            title,
            link,
            published,
            summary,
        });
    }

    Ok(batch)
}

fn format_published(timestamp: DateTime<Utc>, tz: &Tz) -> String {
    timestamp.with_timezone(tz).to_rfc2822()
}

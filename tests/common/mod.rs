#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use ticker_sentiment::analysis_service::AnalysisService;
use ticker_sentiment::classifier::{ClassifierError, SentimentClassifier};
use ticker_sentiment::data_structures::{Classification, FeedEntry, SentimentLabel};
use ticker_sentiment::feed::{FeedBatch, FeedError, FeedSource};

pub fn entry(title: &str, summary: &str) -> FeedEntry {
    FeedEntry {
        title: title.to_string(),
        link: format!("https://example.com/{}", title.replace(' ', "-").to_lowercase()),
        published: "Tue, 14 Oct 2025 13:05:00 +0000".to_string(),
        summary: summary.to_string(),
    }
}

/// Feed source returning a canned batch, or a status error when `fail` is set.
pub struct StaticFeed {
    pub batch: FeedBatch,
    pub fail: bool,
    pub requested: Mutex<Vec<String>>,
}

impl StaticFeed {
    pub fn new(entries: Vec<FeedEntry>) -> Self {
        Self {
            batch: FeedBatch { entries, skipped: 0 },
            fail: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            batch: FeedBatch::default(),
            fail: true,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_feed(&self, ticker: &str) -> Result<FeedBatch, FeedError> {
        self.requested.lock().unwrap().push(ticker.to_string());
        if self.fail {
            return Err(FeedError::Status {
                status: 503,
                url: format!("https://feeds.test/{}", ticker),
            });
        }
        Ok(self.batch.clone())
    }
}

/// Classifier answering from a summary → verdict table; unknown text is an error.
pub struct ScriptedClassifier {
    verdicts: HashMap<String, Classification>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn new(verdicts: &[(&str, SentimentLabel, f64)]) -> Self {
        Self {
            verdicts: verdicts
                .iter()
                .map(|(text, label, confidence)| (text.to_string(), Classification::new(*label, *confidence)))
                .collect(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SentimentClassifier for ScriptedClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());
        self.verdicts
            .get(text)
            .copied()
            .ok_or_else(|| ClassifierError::Unavailable(format!("no verdict scripted for '{}'", text)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn service(feed: StaticFeed, classifier: ScriptedClassifier) -> (AnalysisService, Arc<StaticFeed>, Arc<ScriptedClassifier>) {
    let feed = Arc::new(feed);
    let classifier = Arc::new(classifier);
    let service = AnalysisService::new(feed.clone(), classifier.clone());
    (service, feed, classifier)
}

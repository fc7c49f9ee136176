use crate::classifier::ClassifierError;
use crate::data_structures::{
    AggregateResult, AnalysisOutcome, AnalysisReport, ClassifiedArticle, FeedEntry, NoArticlesReason,
    SentimentDistribution, SentimentLabel, SharedClassifier, SharedFeedSource,
};
use crate::utils::round_to;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub const POSITIVE_THRESHOLD: f64 = 0.15;
pub const NEGATIVE_THRESHOLD: f64 = -0.15;

const MAX_TICKER_LEN: usize = 15;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid ticker symbol '{0}'")]
    InvalidTicker(String),

    #[error("sentiment classification failed for \"{title}\": {source}")]
    Classifier {
        title: String,
        #[source]
        source: ClassifierError,
    },
}

// --- Input Normalisation ---

/// Trims and uppercases a ticker, rejecting anything that is not a plausible symbol.
pub fn normalize_ticker(raw: &str) -> Result<String, AnalysisError> {
    let ticker = raw.trim().to_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

    if valid {
        Ok(ticker)
    } else {
        Err(AnalysisError::InvalidTicker(raw.trim().to_string()))
    }
}

/// Trims and lowercases a keyword; blank keywords mean "no filter".
pub fn normalize_keyword(raw: Option<&str>) -> Option<String> {
    raw.map(|k| k.trim().to_lowercase()).filter(|k| !k.is_empty())
}

// --- Keyword Filter ---

/// Keeps entries whose summary contains `keyword`, ignoring case. No keyword keeps everything.
pub fn filter_by_keyword(entries: Vec<FeedEntry>, keyword: Option<&str>) -> Vec<FeedEntry> {
    let needle = match keyword.map(str::to_lowercase) {
        Some(k) if !k.is_empty() => k,
        _ => return entries,
    };

    entries
        .into_iter()
        .filter(|entry| entry.summary.to_lowercase().contains(&needle))
        .collect()
}

// --- Scoring ---

/// Signed running total over positive and negative articles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SentimentTally {
    pub total: f64,
    pub count: usize,
}

impl SentimentTally {
    pub fn record(&mut self, label: SentimentLabel, confidence: f64) {
        match label {
            SentimentLabel::Positive => {
                self.total += confidence;
                self.count += 1;
            }
            SentimentLabel::Negative => {
                self.total -= confidence;
                self.count += 1;
            }
            SentimentLabel::Neutral => {}
        }
    }

    pub fn from_articles(articles: &[ClassifiedArticle]) -> Self {
        let mut tally = Self::default();
        for article in articles {
            tally.record(article.label, article.confidence);
        }
        tally
    }

    pub fn final_score(&self) -> f64 {
        if self.count > 0 {
            self.total / self.count as f64
        } else {
            0.0
        }
    }

    pub fn aggregate(&self) -> AggregateResult {
        let score = self.final_score();
        AggregateResult {
            overall_label: overall_label(score),
            overall_score: round_to(score, 3),
            scored_articles: self.count,
        }
    }
}

/// Three-way threshold with a closed dead zone boundary on both sides.
pub fn overall_label(final_score: f64) -> SentimentLabel {
    if final_score >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if final_score <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Re-derives the aggregate from already classified articles.
pub fn aggregate(articles: &[ClassifiedArticle]) -> AggregateResult {
    SentimentTally::from_articles(articles).aggregate()
}

// --- Pipeline ---

pub struct AnalysisService {
    feed: SharedFeedSource,
    classifier: SharedClassifier,
}

impl AnalysisService {
    pub fn new(feed: SharedFeedSource, classifier: SharedClassifier) -> Self {
        Self { feed, classifier }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Runs one full analysis: fetch, filter, classify in order, aggregate.
    #[instrument(skip(self), fields(classifier = %self.classifier.name()))]
    pub async fn analyze(&self, ticker: &str, keyword: Option<&str>) -> Result<AnalysisOutcome, AnalysisError> {
        let ticker = normalize_ticker(ticker)?;
        let keyword = normalize_keyword(keyword);

        let batch = match self.feed.fetch_feed(&ticker).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(%ticker, error = %e, "Failed to load news feed");
                return Ok(AnalysisOutcome::NoArticles {
                    ticker,
                    keyword,
                    reason: NoArticlesReason::FeedUnavailable(e.to_string()),
                });
            }
        };

        let skipped_entries = batch.skipped;
        if batch.entries.is_empty() {
            info!(%ticker, skipped_entries, "Feed contained no usable articles");
            return Ok(AnalysisOutcome::NoArticles {
                ticker,
                keyword,
                reason: NoArticlesReason::EmptyFeed,
            });
        }

        let fetched = batch.entries.len();
        let filtered = filter_by_keyword(batch.entries, keyword.as_deref());
        debug!(%ticker, fetched, matched = filtered.len(), "Applied keyword filter");

        if filtered.is_empty() {
            info!(%ticker, ?keyword, fetched, "No articles matched keyword");
            return Ok(AnalysisOutcome::NoArticles {
                ticker,
                keyword,
                reason: NoArticlesReason::NoKeywordMatch,
            });
        }

        let mut tally = SentimentTally::default();
        let mut articles = Vec::with_capacity(filtered.len());

        for entry in filtered {
            let classification = self
                .classifier
                .classify(&entry.summary)
                .await
                .map_err(|source| AnalysisError::Classifier {
                    title: entry.title.clone(),
                    source,
                })?;

            tally.record(classification.label, classification.confidence);
            debug!(title = %entry.title, label = %classification.label, confidence = classification.confidence, "Classified article");

            articles.push(ClassifiedArticle {
                title: entry.title,
                link: entry.link,
                published: entry.published,
                summary: entry.summary,
                label: classification.label,
                confidence: classification.confidence,
            });
        }

        let aggregate = tally.aggregate();
        let distribution = SentimentDistribution::from_articles(&articles);

        info!(
            %ticker,
            articles = articles.len(),
            scored = aggregate.scored_articles,
            overall = %aggregate.overall_label,
            score = aggregate.overall_score,
            "Completed sentiment analysis"
        );

        Ok(AnalysisOutcome::Completed(AnalysisReport {
            ticker,
            keyword,
            articles,
            aggregate,
            distribution,
            skipped_entries,
            generated_at: Utc::now(),
        }))
    }
}

use crate::classifier::SentimentClassifier;
use crate::feed::FeedSource;
use crate::utils::round_to;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

// --- Core Data Structures ---

/// One news item as delivered by the feed source, in feed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Publish time normalised to RFC 2822 in the display timezone; empty when the feed has none.
    pub published: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    /// Parses a classifier label, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "negative" => Some(SentimentLabel::Negative),
            "neutral" => Some(SentimentLabel::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "#2ecc71",
            SentimentLabel::Negative => "#e74c3c",
            SentimentLabel::Neutral => "#95a5a6",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single classifier verdict for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: SentimentLabel, confidence: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedArticle {
    pub title: String,
    pub link: String,
    pub published: String,
    pub summary: String,
    pub label: SentimentLabel,
    /// Raw classifier confidence, rounded to 3 decimals only when displayed or serialized.
    #[serde(serialize_with = "serialize_rounded")]
    pub confidence: f64,
}

impl ClassifiedArticle {
    pub fn display_confidence(&self) -> f64 {
        round_to(self.confidence, 3)
    }
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 3))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub overall_label: SentimentLabel,
    pub overall_score: f64,
    pub scored_articles: usize,
}

// --- Chart Data ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub label: SentimentLabel,
    pub count: usize,
    pub percentage: f64,
}

/// Article counts per label, as plotted by the pie chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentDistribution {
    pub fn from_articles(articles: &[ClassifiedArticle]) -> Self {
        let mut distribution = Self::default();
        for article in articles {
            match article.label {
                SentimentLabel::Positive => distribution.positive += 1,
                SentimentLabel::Negative => distribution.negative += 1,
                SentimentLabel::Neutral => distribution.neutral += 1,
            }
        }
        distribution
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    pub fn count(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
        }
    }

    /// Non-empty slices, largest first. Equal counts keep Positive, Negative, Neutral order.
    pub fn slices(&self) -> Vec<DistributionSlice> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }

        let mut slices: Vec<DistributionSlice> = SentimentLabel::ALL
            .iter()
            .filter(|label| self.count(**label) > 0)
            .map(|label| {
                let count = self.count(*label);
                DistributionSlice {
                    label: *label,
                    count,
                    percentage: count as f64 / total as f64 * 100.0,
                }
            })
            .collect();
        // stable sort keeps label order for ties
        slices.sort_by(|a, b| b.count.cmp(&a.count));
        slices
    }
}

// --- Analysis Results ---

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub keyword: Option<String>,
    pub articles: Vec<ClassifiedArticle>,
    pub aggregate: AggregateResult,
    pub distribution: SentimentDistribution,
    pub skipped_entries: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NoArticlesReason {
    FeedUnavailable(String),
    EmptyFeed,
    NoKeywordMatch,
}

impl NoArticlesReason {
    pub fn hint(&self) -> String {
        match self {
            NoArticlesReason::FeedUnavailable(detail) => {
                format!("The news feed could not be loaded ({}). Try again in a moment.", detail)
            }
            NoArticlesReason::EmptyFeed => {
                "The news feed returned no articles for this ticker. Check the symbol and try again.".to_string()
            }
            NoArticlesReason::NoKeywordMatch => {
                "No articles found matching your keyword. Try again with a broader keyword or leave it blank.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Completed(AnalysisReport),
    NoArticles {
        ticker: String,
        keyword: Option<String>,
        reason: NoArticlesReason,
    },
}

// --- Type Aliases for Shared State ---

// Built once at startup, read-only afterwards
pub type SharedClassifier = Arc<dyn SentimentClassifier>;
pub type SharedFeedSource = Arc<dyn FeedSource>;

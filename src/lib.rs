//! # ticker-sentiment
//!
//! Fetches the news feed for a stock ticker, classifies each article's
//! sentiment, and serves the aggregated result as a small web dashboard.
//!
//! The pipeline is linear: [`feed`] loads entries, [`analysis_service`]
//! filters, classifies and aggregates them, and [`api`] renders the outcome
//! through [`render`] and [`chart`].

pub mod analysis_service;
pub mod api;
pub mod chart;
pub mod classifier;
pub mod config;
pub mod data_structures;
pub mod feed;
pub mod render;
pub mod utils;

pub mod prelude {
    pub use crate::analysis_service::{aggregate, filter_by_keyword, AnalysisError, AnalysisService, SentimentTally};
    pub use crate::classifier::{ClassifierError, SentimentClassifier};
    pub use crate::data_structures::{
        AggregateResult, AnalysisOutcome, AnalysisReport, Classification, ClassifiedArticle, FeedEntry,
        NoArticlesReason, SentimentLabel,
    };
    pub use crate::feed::{FeedBatch, FeedError, FeedSource};
}

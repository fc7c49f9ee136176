use crate::config::{ClassifierBackend, ClassifierConfig};
use crate::data_structures::{Classification, SentimentLabel, SharedClassifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier returned unknown label '{0}'")]
    UnknownLabel(String),

    #[error("classifier returned no predictions")]
    EmptyResponse,
}

/// Anything that can turn a piece of text into a sentiment label and confidence.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;

    fn name(&self) -> &str;
}

/// Builds the configured backend. Called once at startup.
pub fn build_classifier(config: &ClassifierConfig) -> Result<SharedClassifier, ClassifierError> {
    match config.backend {
        ClassifierBackend::HuggingFace => {
            let classifier = HuggingFaceClassifier::new(config)?;
            info!(model = %config.model, endpoint = %classifier.endpoint, "Using HuggingFace inference classifier");
            Ok(Arc::new(classifier))
        }
        ClassifierBackend::Lexicon => {
            info!("Using lexicon classifier");
            Ok(Arc::new(LexiconClassifier::new()))
        }
    }
}

// --- HuggingFace Inference ---

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f64,
}

// The inference API nests predictions one level for single inputs, but not always.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<Prediction>>),
    Flat(Vec<Prediction>),
    Error { error: String },
}

pub struct HuggingFaceClassifier {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
    model: String,
}

impl HuggingFaceClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!(
            "{}/{}",
            config.inference_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_token: config.api_token.clone(),
            model: config.model.clone(),
        })
    }

    fn top_prediction(response: InferenceResponse) -> Result<Classification, ClassifierError> {
        let predictions = match response {
            InferenceResponse::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
            InferenceResponse::Flat(predictions) => predictions,
            InferenceResponse::Error { error } => return Err(ClassifierError::Unavailable(error)),
        };

        let best = predictions
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or(ClassifierError::EmptyResponse)?;

        let label = SentimentLabel::parse(&best.label)
            .ok_or_else(|| ClassifierError::UnknownLabel(best.label.clone()))?;

        Ok(Classification::new(label, best.score))
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceClassifier {
    #[instrument(skip_all, fields(text_len = text.len()))]
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let payload = json!({
            "inputs": text,
            "options": { "wait_for_model": true },
        });

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Inference endpoint responded with error status");
            return Err(ClassifierError::Unavailable(format!(
                "inference endpoint returned status {}",
                status.as_u16()
            )));
        }

        let parsed: InferenceResponse = response.json().await?;
        let classification = Self::top_prediction(parsed)?;
        debug!(model = %self.model, label = %classification.label, confidence = classification.confidence, "Classified text");
        Ok(classification)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// --- Lexicon ---

const BULLISH_TERMS: &[&str] = &[
    "beat", "beats", "boost", "boosts", "breakthrough", "bullish", "buy", "climb", "climbs",
    "gain", "gains", "great", "growth", "improve", "improves", "jump", "jumps", "outperform",
    "profit", "profitable", "rally", "rallies", "record", "rebound", "rise", "rises", "soar",
    "soars", "strong", "surge", "surges", "upgrade", "upgraded", "win", "wins",
];

const BEARISH_TERMS: &[&str] = &[
    "bearish", "crash", "crashes", "cut", "cuts", "decline", "declines", "delay", "delays",
    "downgrade", "downgraded", "drop", "drops", "fall", "falls", "fraud", "lawsuit", "loss",
    "losses", "miss", "missed", "misses", "plunge", "plunges", "probe", "recall", "sell-off",
    "slump", "slumps", "strike", "weak", "warning", "layoffs", "crisis",
];

/// Deterministic keyword-count classifier, an alternative to the inference backend.
#[derive(Debug, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, text: &str) -> Classification {
        let lowered = text.to_lowercase();
        let mut bullish = 0usize;
        let mut bearish = 0usize;

        for token in lowered.split(|c: char| !(c.is_alphanumeric() || c == '-')) {
            if token.is_empty() {
                continue;
            }
            if BULLISH_TERMS.contains(&token) {
                bullish += 1;
            } else if BEARISH_TERMS.contains(&token) {
                bearish += 1;
            }
        }

        let hits = (bullish + bearish) as f64;
        let net = bullish as f64 - bearish as f64;

        if net == 0.0 {
            return Classification::new(SentimentLabel::Neutral, 1.0 / (1.0 + hits));
        }

        let label = if net > 0.0 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        };
        Classification::new(label, 0.5 + 0.5 * net.abs() / (hits + 1.0))
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        Ok(self.score(text))
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

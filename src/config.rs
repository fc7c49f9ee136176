use crate::feed::{DEFAULT_FEED_URL_TEMPLATE, TICKER_PLACEHOLDER};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";
pub const DEFAULT_MODEL: &str = "ProsusAI/finbert";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    HuggingFace,
    Lexicon,
}

impl FromStr for ClassifierBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(ClassifierBackend::HuggingFace),
            "lexicon" => Ok(ClassifierBackend::Lexicon),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub inference_url: String,
    pub model: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::HuggingFace,
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(60),
        }
    }
}

// YAML-serializable classifier section
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ClassifierYaml {
    pub backend: Option<ClassifierBackend>,
    pub inference_url: Option<String>,
    pub model: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub app_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub feed_url_template: Option<String>,
    pub feed_timeout_secs: Option<u64>,
    pub random_user_agent: Option<bool>,
    pub display_timezone: Option<String>,
    pub default_ticker: Option<String>,
    pub default_keyword: Option<String>,
    pub log_json: Option<bool>,
    #[serde(default)]
    pub classifier: ClassifierYaml,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub app_name: String,
    pub environment: String,
    pub port: u16,
    pub feed_url_template: String,
    pub feed_timeout: Duration,
    pub random_user_agent: bool,
    pub display_timezone: Tz,
    pub default_ticker: String,
    pub default_keyword: String,
    pub log_json: bool,
    pub classifier: ClassifierConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "ticker-sentiment".to_string(),
            environment: "development".to_string(),
            port: 8501,
            feed_url_template: DEFAULT_FEED_URL_TEMPLATE.to_string(),
            feed_timeout: Duration::from_secs(30),
            random_user_agent: true,
            display_timezone: chrono_tz::UTC,
            default_ticker: "BA".to_string(),
            default_keyword: "boeing".to_string(),
            log_json: false,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml_file(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml_file(file_path: &str) -> Result<Self, ConfigError> {
        let yaml_content = fs::read_to_string(file_path).map_err(|source| ConfigError::Read {
            path: file_path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, ConfigError> {
        let yaml: ConfigYaml = serde_yaml::from_str(yaml_content)?;
        let defaults = Self::default();

        let classifier = ClassifierConfig {
            backend: yaml.classifier.backend.unwrap_or(defaults.classifier.backend),
            inference_url: yaml
                .classifier
                .inference_url
                .unwrap_or(defaults.classifier.inference_url),
            model: yaml.classifier.model.unwrap_or(defaults.classifier.model),
            api_token: yaml.classifier.api_token.filter(|t| !t.is_empty()),
            timeout: yaml
                .classifier
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.classifier.timeout),
        };

        let display_timezone = match yaml.display_timezone {
            Some(name) => parse_timezone(&name)?,
            None => defaults.display_timezone,
        };

        let config = Self {
            app_name: yaml.app_name.unwrap_or(defaults.app_name),
            environment: yaml.environment.unwrap_or(defaults.environment),
            port: yaml.port.unwrap_or(defaults.port),
            feed_url_template: yaml.feed_url_template.unwrap_or(defaults.feed_url_template),
            feed_timeout: yaml
                .feed_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.feed_timeout),
            random_user_agent: yaml.random_user_agent.unwrap_or(defaults.random_user_agent),
            display_timezone,
            default_ticker: yaml.default_ticker.unwrap_or(defaults.default_ticker),
            default_keyword: yaml.default_keyword.unwrap_or(defaults.default_keyword),
            log_json: yaml.log_json.unwrap_or(defaults.log_json),
            classifier,
        };
        config.validate()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let classifier = ClassifierConfig {
            backend: parse_or("CLASSIFIER_BACKEND", lookup("CLASSIFIER_BACKEND"), defaults.classifier.backend)?,
            inference_url: lookup("HF_INFERENCE_URL").unwrap_or(defaults.classifier.inference_url),
            model: lookup("HF_MODEL").unwrap_or(defaults.classifier.model),
            api_token: lookup("HF_API_TOKEN").filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(parse_or(
                "CLASSIFIER_TIMEOUT_SECS",
                lookup("CLASSIFIER_TIMEOUT_SECS"),
                defaults.classifier.timeout.as_secs(),
            )?),
        };

        let display_timezone = match lookup("DISPLAY_TIMEZONE") {
            Some(name) => parse_timezone(&name)?,
            None => defaults.display_timezone,
        };

        let config = Self {
            app_name: lookup("APP_NAME").unwrap_or(defaults.app_name),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            port: parse_or("PORT", lookup("PORT"), defaults.port)?,
            feed_url_template: lookup("FEED_URL_TEMPLATE").unwrap_or(defaults.feed_url_template),
            feed_timeout: Duration::from_secs(parse_or(
                "FEED_TIMEOUT_SECS",
                lookup("FEED_TIMEOUT_SECS"),
                defaults.feed_timeout.as_secs(),
            )?),
            random_user_agent: parse_or("RANDOM_USER_AGENT", lookup("RANDOM_USER_AGENT"), defaults.random_user_agent)?,
            display_timezone,
            default_ticker: lookup("DEFAULT_TICKER").unwrap_or(defaults.default_ticker),
            default_keyword: lookup("DEFAULT_KEYWORD").unwrap_or(defaults.default_keyword),
            log_json: parse_or("LOG_JSON", lookup("LOG_JSON"), defaults.log_json)?,
            classifier,
        };
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !self.feed_url_template.contains(TICKER_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                key: "FEED_URL_TEMPLATE",
                value: self.feed_url_template,
            });
        }
        Ok(self)
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map_err(|_| ConfigError::InvalidValue { key, value })
        }
        None => Ok(default),
    }
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: "DISPLAY_TIMEZONE",
        value: name.to_string(),
    })
}

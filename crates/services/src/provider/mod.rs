//! Question sources: the Open Trivia DB API and a local JSON file.

mod local;
mod remote;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{Difficulty, Question};
use reqwest::Client;
use url::Url;

use crate::error::ProviderError;

pub use local::fallback_questions;

pub const DEFAULT_TRIVIA_BASE_URL: &str = "https://opentdb.com";
pub const DEFAULT_LOCAL_QUESTIONS: &str = "questions.json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Supplies the question list a session is built from.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Fetch `count` questions from the remote trivia source.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failure, a non-success status, an
    /// API-level error code, or an empty result.
    async fn fetch_remote(
        &self,
        count: u32,
        category: Option<u32>,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, ProviderError>;

    /// Read the local question list. Never fails: any problem yields the
    /// embedded fallback list.
    async fn fetch_local(&self) -> Vec<Question>;
}

#[derive(Clone, Debug)]
pub struct TriviaConfig {
    pub base_url: String,
    pub local_path: PathBuf,
    pub timeout: Duration,
}

impl TriviaConfig {
    /// Build a config, validating the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidBaseUrl` when `base_url` does not parse.
    pub fn new(
        base_url: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Result<Self, ProviderError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/').to_string();
        if Url::parse(&trimmed).is_err() {
            return Err(ProviderError::InvalidBaseUrl(base_url));
        }
        Ok(Self {
            base_url: trimmed,
            local_path: local_path.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `QUIZ_TRIVIA_BASE_URL` and `QUIZ_LOCAL_QUESTIONS`, with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidBaseUrl` for an unparsable base URL.
    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url = env::var("QUIZ_TRIVIA_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TRIVIA_BASE_URL.into());
        let local_path = env::var("QUIZ_LOCAL_QUESTIONS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOCAL_QUESTIONS.into());
        Self::new(base_url, local_path)
    }

    fn endpoint(
        &self,
        count: u32,
        category: Option<u32>,
        difficulty: Option<Difficulty>,
    ) -> Result<Url, ProviderError> {
        let mut params = vec![
            ("amount", count.to_string()),
            ("type", "multiple".to_string()),
            ("encode", "url3986".to_string()),
        ];
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        if let Some(difficulty) = difficulty.filter(|d| d.is_known()) {
            params.push(("difficulty", difficulty.as_str().to_string()));
        }
        let endpoint = format!("{}/api.php", self.base_url);
        Url::parse_with_params(&endpoint, &params)
            .map_err(|_| ProviderError::InvalidBaseUrl(self.base_url.clone()))
    }
}

/// Provider backed by the Open Trivia DB API and a local question file.
#[derive(Clone)]
pub struct TriviaProvider {
    client: Client,
    config: TriviaConfig,
}

impl TriviaProvider {
    #[must_use]
    pub fn new(config: TriviaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl QuestionProvider for TriviaProvider {
    async fn fetch_remote(
        &self,
        count: u32,
        category: Option<u32>,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, ProviderError> {
        let url = self.config.endpoint(count, category, difficulty)?;
        tracing::debug!(%url, "fetching trivia questions");

        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: remote::TriviaResponse = response.json().await?;
        remote::into_questions(body, &mut rand::rng())
    }

    async fn fetch_local(&self) -> Vec<Question> {
        match local::read_question_file(&self.config.local_path).await {
            Ok(questions) => questions,
            Err(err) => {
                tracing::warn!(
                    path = %self.config.local_path.display(),
                    error = %err,
                    "could not load local questions, using embedded fallback"
                );
                fallback_questions()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_bad_base_url() {
        let err = TriviaConfig::new("not a url", "questions.json").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidBaseUrl(_)));
    }

    #[test]
    fn endpoint_carries_filters() {
        let config = TriviaConfig::new("https://opentdb.com/", "questions.json").unwrap();
        let url = config.endpoint(10, Some(9), Some(Difficulty::Hard)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://opentdb.com/api.php?amount=10&type=multiple&encode=url3986&category=9&difficulty=hard"
        );
    }

    #[test]
    fn endpoint_skips_missing_filters() {
        let config = TriviaConfig::new("https://opentdb.com", "questions.json").unwrap();
        let url = config.endpoint(3, None, Some(Difficulty::Unknown)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://opentdb.com/api.php?amount=3&type=multiple&encode=url3986"
        );
    }

    #[tokio::test]
    async fn missing_local_file_yields_fallback() {
        let config =
            TriviaConfig::new(DEFAULT_TRIVIA_BASE_URL, "/definitely/not/here.json").unwrap();
        let provider = TriviaProvider::new(config);
        let questions = provider.fetch_local().await;
        assert_eq!(questions, fallback_questions());
    }
}

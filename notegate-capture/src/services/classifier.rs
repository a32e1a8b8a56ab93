//! Classification oracle client
//!
//! Wraps the remote classifier behind the [`Classifier`] trait. The
//! adapter never surfaces oracle trouble as a Rust error: every call ends
//! in a tagged [`ClassifyOutcome`], and the router's behavior is a pure
//! function of that outcome. Response validation fails closed; anything
//! off-contract becomes a permanent failure, never a low-confidence
//! success.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use notegate_common::categories::{Category, CategoryKind};
use notegate_common::records::RecordFields;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClassifierConfig;

/// First retry backoff; doubles per attempt
const INITIAL_BACKOFF_MS: u64 = 100;

/// Backoff ceiling
const MAX_BACKOFF_MS: u64 = 2000;

/// A successful classification
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub confidence: f64,
    pub fields: RecordFields,
    pub tags: Vec<String>,
}

/// Tagged result of a classify call
#[derive(Debug, Clone)]
pub enum ClassifyOutcome {
    Success(Classification),
    /// Worth retrying later (network, timeout, 5xx, 429). The adapter has
    /// already spent its own retry budget when this surfaces.
    Transient { reason: String },
    /// Retrying cannot help (malformed response, unknown category, 4xx)
    Permanent { reason: String },
}

/// Classification oracle interface
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify free text into a dynamic category.
    ///
    /// `constrain_to` forces extraction for one specific category, used
    /// when the user has already named it; the oracle is then trusted for
    /// field extraction only, never for category choice.
    async fn classify(&self, text: &str, constrain_to: Option<Category>) -> ClassifyOutcome;
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    constrain_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    category: String,
    confidence: f64,
    #[serde(default)]
    fields: HashMap<String, String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// HTTP client for the classification oracle
pub struct HttpClassifier {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl HttpClassifier {
    /// Create new oracle client from configuration
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        }
    }

    async fn attempt(&self, text: &str, constrain_to: Option<Category>) -> ClassifyOutcome {
        let request = ClassifyRequest {
            text,
            constrain_to: constrain_to.map(|c| c.as_str()),
        };

        let mut builder = self
            .http_client
            .post(format!("{}/classify", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                return ClassifyOutcome::Transient {
                    reason: format!("classifier unreachable: {}", e),
                };
            }
        };

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return ClassifyOutcome::Transient {
                reason: format!("classifier returned {}", status),
            };
        }
        if !status.is_success() {
            return ClassifyOutcome::Permanent {
                reason: format!("classifier returned {}", status),
            };
        }

        let body: ClassifyResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                return ClassifyOutcome::Permanent {
                    reason: format!("malformed classifier response: {}", e),
                };
            }
        };

        validate_response(body, constrain_to)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str, constrain_to: Option<Category>) -> ClassifyOutcome {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut attempt = 0u32;

        loop {
            let outcome = self.attempt(text, constrain_to).await;

            match outcome {
                ClassifyOutcome::Transient { ref reason } if attempt < self.max_retries => {
                    // Jitter spreads retries out when several messages hit
                    // a struggling oracle at once
                    let jitter = rand::thread_rng().gen_range(0..=backoff_ms / 4);
                    warn!(
                        attempt = attempt + 1,
                        reason = %reason,
                        "Transient classifier failure, retrying in {}ms",
                        backoff_ms + jitter
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms + jitter)).await;
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                    attempt += 1;
                }
                outcome => {
                    if let ClassifyOutcome::Success(ref c) = outcome {
                        debug!(
                            category = %c.category,
                            confidence = c.confidence,
                            constrained = constrain_to.is_some(),
                            "Classified message"
                        );
                    }
                    return outcome;
                }
            }
        }
    }
}

/// Validate the oracle's response shape against the closed category set.
fn validate_response(body: ClassifyResponse, constrain_to: Option<Category>) -> ClassifyOutcome {
    let Some(category) = Category::parse_canonical(&body.category) else {
        return ClassifyOutcome::Permanent {
            reason: format!("unknown category '{}'", body.category),
        };
    };

    if category.kind() != CategoryKind::Dynamic {
        return ClassifyOutcome::Permanent {
            reason: format!("oracle returned reference category '{}'", category),
        };
    }

    if let Some(expected) = constrain_to {
        if category != expected {
            return ClassifyOutcome::Permanent {
                reason: format!(
                    "oracle ignored constraint: wanted '{}', got '{}'",
                    expected, category
                ),
            };
        }
    }

    if !(0.0..=1.0).contains(&body.confidence) {
        return ClassifyOutcome::Permanent {
            reason: format!("confidence {} out of range", body.confidence),
        };
    }

    match RecordFields::from_oracle_map(category, &body.fields) {
        Ok(fields) => ClassifyOutcome::Success(Classification {
            category,
            confidence: body.confidence,
            fields,
            tags: body.tags,
        }),
        Err(e) => ClassifyOutcome::Permanent {
            reason: e.to_string(),
        },
    }
}

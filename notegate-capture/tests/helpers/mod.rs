//! Test helpers for capture pipeline integration tests
//!
//! Provides reusable test infrastructure:
//! - ScriptedClassifier: plays back a fixed sequence of oracle outcomes
//! - RecordingGateway: collects outbound chat messages in memory
//! - TestHarness: AppState wired to an in-memory database

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;

use notegate_capture::config::CaptureConfig;
use notegate_capture::error::IngestError;
use notegate_capture::ingest::{self, InboundAck, InboundMessage};
use notegate_capture::services::{Classification, Classifier, ClassifyOutcome, Transport};
use notegate_capture::AppState;
use notegate_common::db::models::AuditEntry;
use notegate_common::records::RecordFields;
use notegate_common::Category;

/// Classifier double that replays scripted outcomes in order and records
/// every call. Once the script runs out it reports a permanent failure.
pub struct ScriptedClassifier {
    outcomes: Mutex<VecDeque<ClassifyOutcome>>,
    calls: Mutex<Vec<(String, Option<Category>)>>,
    delay: Option<Duration>,
}

impl ScriptedClassifier {
    pub fn new(outcomes: Vec<ClassifyOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Delay every call, for deadline tests.
    pub fn with_delay(outcomes: Vec<ClassifyOutcome>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(outcomes)
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<Category>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, text: &str, constrain_to: Option<Category>) -> ClassifyOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), constrain_to));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or(ClassifyOutcome::Permanent {
            reason: "script exhausted".to_string(),
        })
    }
}

/// One message sent through the recording gateway.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub text: String,
    pub in_reply_to: Option<String>,
    pub message_ref: String,
}

/// Transport double that hands out refs bot-1, bot-2, ... and can be
/// switched into a failing mode.
pub struct RecordingGateway {
    sent: Mutex<Vec<SentMessage>>,
    counter: AtomicU64,
    failing: AtomicBool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> Option<SentMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for RecordingGateway {
    async fn send(&self, text: &str, in_reply_to: Option<&str>) -> Result<String, IngestError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(IngestError::Transport("gateway unavailable".to_string()));
        }
        let message_ref = format!("bot-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.sent.lock().unwrap().push(SentMessage {
            text: text.to_string(),
            in_reply_to: in_reply_to.map(String::from),
            message_ref: message_ref.clone(),
        });
        Ok(message_ref)
    }
}

/// Everything a pipeline test needs: shared state plus handles onto the
/// doubles for assertions.
pub struct TestHarness {
    pub state: AppState,
    pub classifier: Arc<ScriptedClassifier>,
    pub gateway: Arc<RecordingGateway>,
}

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();
    notegate_common::db::create_tables(&pool)
        .await
        .expect("Failed to create tables");
    pool
}

pub fn test_config() -> CaptureConfig {
    let mut config = CaptureConfig::default();
    // Tests never want to wait out the production deadline
    config.classifier.overall_deadline_ms = 2_000;
    config
}

pub async fn harness(outcomes: Vec<ClassifyOutcome>) -> TestHarness {
    harness_with(ScriptedClassifier::new(outcomes), test_config()).await
}

pub async fn harness_with(classifier: ScriptedClassifier, config: CaptureConfig) -> TestHarness {
    let classifier = Arc::new(classifier);
    let gateway = Arc::new(RecordingGateway::new());
    let db = memory_pool().await;
    let state = AppState::new(db, config, classifier.clone(), gateway.clone());
    TestHarness {
        state,
        classifier,
        gateway,
    }
}

/// Push one message through the pipeline, panicking on storage errors.
pub async fn deliver(
    harness: &TestHarness,
    text: &str,
    source_ref: &str,
    reply_to: Option<&str>,
) -> InboundAck {
    ingest::handle_inbound(
        &harness.state,
        InboundMessage {
            text: text.to_string(),
            source_ref: source_ref.to_string(),
            reply_to: reply_to.map(String::from),
        },
    )
    .await
    .expect("pipeline failed")
}

pub async fn audit_row(pool: &SqlitePool, source_ref: &str) -> AuditEntry {
    notegate_capture::db::audit::find_by_source_ref(pool, source_ref)
        .await
        .expect("audit lookup failed")
        .expect("no audit entry for source_ref")
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub fn success(
    category: Category,
    confidence: f64,
    fields: RecordFields,
    tags: Vec<String>,
) -> ClassifyOutcome {
    ClassifyOutcome::Success(Classification {
        category,
        confidence,
        fields,
        tags,
    })
}

pub fn people_outcome(confidence: f64) -> ClassifyOutcome {
    success(
        Category::People,
        confidence,
        RecordFields::People {
            name: "Dana".to_string(),
            context: Some("met at the meetup".to_string()),
            follow_ups: None,
        },
        vec!["meetup".to_string()],
    )
}

pub fn project_outcome(confidence: f64) -> ClassifyOutcome {
    success(
        Category::Projects,
        confidence,
        RecordFields::Projects {
            name: "notegate".to_string(),
            status: "active".to_string(),
            next_action: Some("write tests".to_string()),
            notes: None,
        },
        Vec::new(),
    )
}

pub fn idea_outcome(confidence: f64) -> ClassifyOutcome {
    success(
        Category::Ideas,
        confidence,
        RecordFields::Ideas {
            title: "solar shed".to_string(),
            one_liner: Some("panel the shed roof".to_string()),
            elaboration: None,
        },
        Vec::new(),
    )
}

pub fn admin_outcome(confidence: f64) -> ClassifyOutcome {
    success(
        Category::Admin,
        confidence,
        RecordFields::Admin {
            name: "renew passport".to_string(),
            due_date: Some("2026-09-15".to_string()),
            notes: None,
        },
        Vec::new(),
    )
}

pub fn transient(reason: &str) -> ClassifyOutcome {
    ClassifyOutcome::Transient {
        reason: reason.to_string(),
    }
}

pub fn permanent(reason: &str) -> ClassifyOutcome {
    ClassifyOutcome::Permanent {
        reason: reason.to_string(),
    }
}

//! External service clients: the classification oracle and the chat gateway.
//!
//! Both sit behind small traits so the ingest pipeline runs against stubs
//! in tests and against HTTP clients in production.

pub mod classifier;
pub mod gateway;

pub use classifier::{Classification, Classifier, ClassifyOutcome, HttpClassifier};
pub use gateway::{HttpGateway, Transport};

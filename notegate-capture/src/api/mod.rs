//! HTTP API endpoints

pub mod health;
pub mod inbound;
pub mod review;
pub mod sse;

//! Database access for the capture service.
//!
//! Write paths that touch more than one table run as single transactions
//! built inside this layer; the ingest pipeline wraps them in
//! [`retry::retry_on_lock`] to absorb short lock contention under WAL.

pub mod audit;
pub mod clarifications;
pub mod records;
pub mod retry;
pub mod search;

/// Total time budget for lock retries around one write set
pub const MAX_LOCK_WAIT_MS: u64 = 5000;

/// True when the error is a UNIQUE constraint violation.
///
/// The audit log's unique source_ref turns concurrent duplicate delivery
/// into exactly this error on the losing insert.
pub fn is_unique_violation(err: &notegate_common::Error) -> bool {
    matches!(
        err,
        notegate_common::Error::Database(sqlx::Error::Database(db_err))
            if db_err.message().contains("UNIQUE constraint failed")
    )
}

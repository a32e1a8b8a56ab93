//! Tests for database initialization and schema constraints

use notegate_common::db::{create_tables, init_database};
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();
    create_tables(&pool).await.expect("Failed to create tables");
    pool
}

#[tokio::test]
async fn test_create_tables_is_idempotent() {
    let pool = memory_pool().await;
    create_tables(&pool).await.expect("Second run must succeed");

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "admin",
        "audit_log",
        "decisions",
        "howtos",
        "ideas",
        "pending_clarifications",
        "people",
        "projects",
        "snippets",
    ] {
        assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_init_database_creates_file_and_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("notegate.db");

    let pool = init_database(&db_path).await.expect("init must succeed");
    assert!(db_path.exists());

    // Re-opening an existing database must also succeed
    drop(pool);
    let pool = init_database(&db_path).await.expect("re-init must succeed");
    sqlx::query("SELECT COUNT(*) FROM audit_log")
        .fetch_one(&pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_source_ref_is_unique() {
    let pool = memory_pool().await;

    let insert = "INSERT INTO audit_log (id, raw_text, status, source_ref) VALUES (?, ?, 'filed', ?)";
    sqlx::query(insert)
        .bind("a1")
        .bind("first")
        .bind("msg-1")
        .execute(&pool)
        .await
        .unwrap();

    let dup = sqlx::query(insert)
        .bind("a2")
        .bind("second")
        .bind("msg-1")
        .execute(&pool)
        .await;
    assert!(dup.is_err(), "duplicate source_ref must be rejected");
}

#[tokio::test]
async fn test_audit_status_is_check_constrained() {
    let pool = memory_pool().await;

    let result = sqlx::query(
        "INSERT INTO audit_log (id, raw_text, status, source_ref) VALUES ('a1', 'x', 'open', 'msg-1')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err(), "unknown status must be rejected");
}

#[tokio::test]
async fn test_pending_clarification_is_one_per_entry_and_cascades() {
    let pool = memory_pool().await;

    sqlx::query("INSERT INTO audit_log (id, raw_text, status, source_ref) VALUES ('a1', 'x', 'needs_review', 'msg-1')")
        .execute(&pool)
        .await
        .unwrap();

    let insert =
        "INSERT INTO pending_clarifications (id, audit_entry_id, prompt_ref) VALUES (?, 'a1', ?)";
    sqlx::query(insert)
        .bind("p1")
        .bind("bot-1")
        .execute(&pool)
        .await
        .unwrap();

    // Second open clarification for the same entry is rejected
    let dup = sqlx::query(insert).bind("p2").bind("bot-2").execute(&pool).await;
    assert!(dup.is_err());

    // Deleting the audit entry sweeps its pending row
    sqlx::query("DELETE FROM audit_log WHERE id = 'a1'")
        .execute(&pool)
        .await
        .unwrap();
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_clarifications")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_project_status_is_check_constrained() {
    let pool = memory_pool().await;

    let result =
        sqlx::query("INSERT INTO projects (id, name, status) VALUES ('r1', 'kitchen', 'paused')")
            .execute(&pool)
            .await;
    assert!(result.is_err());

    sqlx::query("INSERT INTO projects (id, name, status) VALUES ('r1', 'kitchen', 'waiting')")
        .execute(&pool)
        .await
        .unwrap();
}

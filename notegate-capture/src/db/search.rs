//! Read-side queries for the chat commands: substring search and listings.
//!
//! Search is SQLite LIKE over the text columns of each category table,
//! ordered by recency. Results come back as [`RecordFields`] so the
//! formatting layer can match on category exhaustively.

use chrono::{DateTime, Utc};
use notegate_common::records::RecordFields;
use notegate_common::Result;
use sqlx::{Row, SqlitePool};

/// One search or listing result
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub fields: RecordFields,
    pub created_at: DateTime<Utc>,
}

/// Escape LIKE wildcards in user input and wrap in %...%.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Search every category table.
pub async fn search_all(pool: &SqlitePool, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
    let pattern = like_pattern(query);
    let per_table = limit as i64;

    let mut hits = Vec::new();
    hits.extend(search_people_table(pool, &pattern, per_table).await?);
    hits.extend(search_projects_table(pool, &pattern, per_table).await?);
    hits.extend(search_ideas_table(pool, &pattern, per_table).await?);
    hits.extend(search_admin_table(pool, &pattern, per_table).await?);
    hits.extend(search_reference_tables(pool, &pattern, per_table).await?);

    hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    hits.truncate(limit);
    Ok(hits)
}

/// Search only the reference tables (decisions, howtos, snippets).
pub async fn search_reference(
    pool: &SqlitePool,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    let pattern = like_pattern(query);
    let mut hits = search_reference_tables(pool, &pattern, limit as i64).await?;
    hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    hits.truncate(limit);
    Ok(hits)
}

/// Search the people table only.
pub async fn search_people(pool: &SqlitePool, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
    let pattern = like_pattern(query);
    let mut hits = search_people_table(pool, &pattern, limit as i64).await?;
    hits.truncate(limit);
    Ok(hits)
}

async fn search_reference_tables(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let mut hits = search_decisions_table(pool, pattern, limit).await?;
    hits.extend(search_howtos_table(pool, pattern, limit).await?);
    hits.extend(search_snippets_table(pool, pattern, limit).await?);
    Ok(hits)
}

async fn search_people_table(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT name, context, follow_ups, created_at
        FROM people
        WHERE (name || ' ' || COALESCE(context, '') || ' ' || COALESCE(follow_ups, '')) LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::People {
                name: row.get("name"),
                context: row.get("context"),
                follow_ups: row.get("follow_ups"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn search_projects_table(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT name, status, next_action, notes, created_at
        FROM projects
        WHERE (name || ' ' || COALESCE(next_action, '') || ' ' || COALESCE(notes, '')) LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Projects {
                name: row.get("name"),
                status: row.get("status"),
                next_action: row.get("next_action"),
                notes: row.get("notes"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn search_ideas_table(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT title, one_liner, elaboration, created_at
        FROM ideas
        WHERE (title || ' ' || COALESCE(one_liner, '') || ' ' || COALESCE(elaboration, '')) LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Ideas {
                title: row.get("title"),
                one_liner: row.get("one_liner"),
                elaboration: row.get("elaboration"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn search_admin_table(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT name, due_date, notes, created_at
        FROM admin
        WHERE (name || ' ' || COALESCE(notes, '')) LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Admin {
                name: row.get("name"),
                due_date: row.get("due_date"),
                notes: row.get("notes"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn search_decisions_table(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT title, decision, rationale, context, created_at
        FROM decisions
        WHERE (title || ' ' || decision || ' ' || COALESCE(rationale, '') || ' ' || COALESCE(context, '')) LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Decisions {
                title: row.get("title"),
                decision: row.get("decision"),
                rationale: row.get("rationale"),
                context: row.get("context"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn search_howtos_table(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT title, content, created_at
        FROM howtos
        WHERE (title || ' ' || content) LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Howtos {
                title: row.get("title"),
                content: row.get("content"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

async fn search_snippets_table(
    pool: &SqlitePool,
    pattern: &str,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT title, content, created_at
        FROM snippets
        WHERE (title || ' ' || content) LIKE ? ESCAPE '\'
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Snippets {
                title: row.get("title"),
                content: row.get("content"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

/// List projects, optionally filtered to one status.
///
/// Unfiltered listings order active work first, then by recency inside
/// each status group.
pub async fn list_projects(
    pool: &SqlitePool,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<SearchHit>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(
                r#"
                SELECT name, status, next_action, notes, created_at
                FROM projects
                WHERE status = ?
                ORDER BY updated_at DESC
                LIMIT ?
                "#,
            )
            .bind(status)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT name, status, next_action, notes, created_at
                FROM projects
                ORDER BY
                    CASE status
                        WHEN 'active' THEN 1
                        WHEN 'waiting' THEN 2
                        WHEN 'blocked' THEN 3
                        WHEN 'someday' THEN 4
                        ELSE 5
                    END,
                    updated_at DESC
                LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Projects {
                name: row.get("name"),
                status: row.get("status"),
                next_action: row.get("next_action"),
                notes: row.get("notes"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

/// List ideas, newest first.
pub async fn list_ideas(pool: &SqlitePool, limit: i64) -> Result<Vec<SearchHit>> {
    let rows = sqlx::query(
        r#"
        SELECT title, one_liner, elaboration, created_at
        FROM ideas
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Ideas {
                title: row.get("title"),
                one_liner: row.get("one_liner"),
                elaboration: row.get("elaboration"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

/// List pending admin tasks. Dated tasks come first in due order; with
/// `due_only`, undated tasks are left out entirely.
pub async fn list_admin(pool: &SqlitePool, due_only: bool, limit: i64) -> Result<Vec<SearchHit>> {
    let rows = if due_only {
        sqlx::query(
            r#"
            SELECT name, due_date, notes, created_at
            FROM admin
            WHERE status = 'pending' AND due_date IS NOT NULL
            ORDER BY due_date ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query(
            r#"
            SELECT name, due_date, notes, created_at
            FROM admin
            WHERE status = 'pending'
            ORDER BY (due_date IS NULL) ASC, due_date ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?
    };

    Ok(rows
        .into_iter()
        .map(|row| SearchHit {
            fields: RecordFields::Admin {
                name: row.get("name"),
                due_date: row.get("due_date"),
                notes: row.get("notes"),
            },
            created_at: row.get("created_at"),
        })
        .collect())
}

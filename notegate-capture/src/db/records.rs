//! Category record writes.
//!
//! These run inside the caller's transaction: a record insert is never
//! visible without its audit_log counterpart.

use chrono::Utc;
use notegate_common::categories::Category;
use notegate_common::records::{tags_to_json, RecordFields};
use notegate_common::Result;
use sqlx::SqliteConnection;

/// Insert a record into its category table.
pub async fn insert_record(
    conn: &mut SqliteConnection,
    record_id: &str,
    fields: &RecordFields,
    tags: &[String],
) -> Result<()> {
    let tags_json = tags_to_json(tags)?;
    let now = Utc::now();

    match fields {
        RecordFields::People {
            name,
            context,
            follow_ups,
        } => {
            sqlx::query(
                r#"
                INSERT INTO people (id, name, context, follow_ups, tags, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record_id)
            .bind(name.as_str())
            .bind(context.as_deref())
            .bind(follow_ups.as_deref())
            .bind(tags_json.as_str())
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?;
        }
        RecordFields::Projects {
            name,
            status,
            next_action,
            notes,
        } => {
            sqlx::query(
                r#"
                INSERT INTO projects (id, name, status, next_action, notes, tags, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record_id)
            .bind(name.as_str())
            .bind(status.as_str())
            .bind(next_action.as_deref())
            .bind(notes.as_deref())
            .bind(tags_json.as_str())
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?;
        }
        RecordFields::Ideas {
            title,
            one_liner,
            elaboration,
        } => {
            sqlx::query(
                r#"
                INSERT INTO ideas (id, title, one_liner, elaboration, tags, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record_id)
            .bind(title.as_str())
            .bind(one_liner.as_deref())
            .bind(elaboration.as_deref())
            .bind(tags_json.as_str())
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?;
        }
        RecordFields::Admin {
            name,
            due_date,
            notes,
        } => {
            sqlx::query(
                r#"
                INSERT INTO admin (id, name, due_date, notes, tags, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record_id)
            .bind(name.as_str())
            .bind(due_date.as_deref())
            .bind(notes.as_deref())
            .bind(tags_json.as_str())
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?;
        }
        RecordFields::Decisions {
            title,
            decision,
            rationale,
            context,
        } => {
            sqlx::query(
                r#"
                INSERT INTO decisions (id, title, decision, rationale, context, tags, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record_id)
            .bind(title.as_str())
            .bind(decision.as_str())
            .bind(rationale.as_deref())
            .bind(context.as_deref())
            .bind(tags_json.as_str())
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?;
        }
        RecordFields::Howtos { title, content } => {
            sqlx::query(
                r#"
                INSERT INTO howtos (id, title, content, tags, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record_id)
            .bind(title.as_str())
            .bind(content.as_str())
            .bind(tags_json.as_str())
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?;
        }
        RecordFields::Snippets { title, content } => {
            sqlx::query(
                r#"
                INSERT INTO snippets (id, title, content, tags, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record_id)
            .bind(title.as_str())
            .bind(content.as_str())
            .bind(tags_json.as_str())
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?;
        }
    }

    Ok(())
}

/// Delete a record from its category table. True when a row was removed.
pub async fn delete_record(
    conn: &mut SqliteConnection,
    category: Category,
    record_id: &str,
) -> Result<bool> {
    let sql = match category {
        Category::People => "DELETE FROM people WHERE id = ?",
        Category::Projects => "DELETE FROM projects WHERE id = ?",
        Category::Ideas => "DELETE FROM ideas WHERE id = ?",
        Category::Admin => "DELETE FROM admin WHERE id = ?",
        Category::Decisions => "DELETE FROM decisions WHERE id = ?",
        Category::Howtos => "DELETE FROM howtos WHERE id = ?",
        Category::Snippets => "DELETE FROM snippets WHERE id = ?",
    };

    let result = sqlx::query(sql).bind(record_id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

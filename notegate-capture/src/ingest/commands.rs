//! Query commands: `?recall`, `?search`, `?people`, `?projects`,
//! `?ideas`, `?admin`.
//!
//! Commands are read-only and are answered before any capture handling,
//! so a query reply never consumes an open clarification.

use notegate_common::records::{RecordFields, PROJECT_STATUSES};
use sqlx::SqlitePool;

use crate::db::search::{self, SearchHit};
use crate::error::IngestError;

const SEARCH_LIMIT: usize = 10;
const LIST_LIMIT: i64 = 20;

/// A parsed query command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    /// Search reference categories only.
    Recall(String),
    /// Search all categories.
    Search(String),
    /// Search people only.
    People(String),
    /// List projects, optionally filtered to one status.
    Projects(Option<String>),
    /// List ideas.
    Ideas,
    /// List pending admin tasks, optionally only dated ones.
    Admin { due: bool },
}

/// Parse a message as a query command.
///
/// Only a leading `?` directly followed by the command word counts;
/// `? recall`, `??recall`, and embedded question marks are all ordinary
/// message text.
pub fn parse_command(text: &str) -> Option<QueryCommand> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix('?')?;
    if rest.starts_with('?') {
        return None;
    }
    let (word, arg) = match rest.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (rest, ""),
    };
    if word.is_empty() || arg.contains('\n') {
        return None;
    }
    let word = word.to_lowercase();
    let arg = arg.to_lowercase();

    match word.as_str() {
        "recall" if !arg.is_empty() => Some(QueryCommand::Recall(arg)),
        "search" if !arg.is_empty() => Some(QueryCommand::Search(arg)),
        "people" if !arg.is_empty() => Some(QueryCommand::People(arg)),
        "projects" if arg.is_empty() => Some(QueryCommand::Projects(None)),
        "projects" if PROJECT_STATUSES.contains(&arg.as_str()) => {
            Some(QueryCommand::Projects(Some(arg)))
        }
        "ideas" if arg.is_empty() => Some(QueryCommand::Ideas),
        "admin" if arg.is_empty() => Some(QueryCommand::Admin { due: false }),
        "admin" if arg == "due" => Some(QueryCommand::Admin { due: true }),
        _ => None,
    }
}

/// Run a query command and format the chat reply.
pub async fn handle_command(
    pool: &SqlitePool,
    command: QueryCommand,
) -> Result<String, IngestError> {
    let reply = match command {
        QueryCommand::Recall(query) => {
            let hits = search::search_reference(pool, &query, SEARCH_LIMIT).await?;
            format_search_results(&query, &hits)
        }
        QueryCommand::Search(query) => {
            let hits = search::search_all(pool, &query, SEARCH_LIMIT).await?;
            format_search_results(&query, &hits)
        }
        QueryCommand::People(query) => {
            let hits = search::search_people(pool, &query, SEARCH_LIMIT).await?;
            format_search_results(&query, &hits)
        }
        QueryCommand::Projects(status) => {
            let hits = search::list_projects(pool, status.as_deref(), LIST_LIMIT).await?;
            format_project_list(&hits)
        }
        QueryCommand::Ideas => {
            let hits = search::list_ideas(pool, LIST_LIMIT).await?;
            format_idea_list(&hits)
        }
        QueryCommand::Admin { due } => {
            let hits = search::list_admin(pool, due, LIST_LIMIT).await?;
            format_admin_list(&hits)
        }
    };
    Ok(reply)
}

fn format_search_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("🔍 No results for: {}", query);
    }
    let blocks: Vec<String> = hits.iter().map(|hit| format_hit(&hit.fields)).collect();
    format!("🔍 Results for: {}\n\n{}", query, blocks.join("\n\n"))
}

fn format_hit(fields: &RecordFields) -> String {
    match fields {
        RecordFields::People {
            name,
            context,
            follow_ups,
        } => {
            let mut block = format!("[PERSON] {}", name);
            if let Some(context) = context {
                block.push_str(&format!("\nContext: {}", context));
            }
            if let Some(follow_ups) = follow_ups {
                block.push_str(&format!("\nFollow-ups: {}", follow_ups));
            }
            block
        }
        RecordFields::Projects {
            name,
            status,
            next_action,
            ..
        } => {
            let mut block = format!("[PROJECT] {} ({})", name, status);
            if let Some(next_action) = next_action {
                block.push_str(&format!("\nNext: {}", next_action));
            }
            block
        }
        RecordFields::Ideas {
            title, one_liner, ..
        } => {
            let mut block = format!("[IDEA] {}", title);
            if let Some(one_liner) = one_liner {
                block.push_str(&format!("\n{}", one_liner));
            }
            block
        }
        RecordFields::Admin {
            name, due_date, ..
        } => match due_date {
            Some(due_date) => format!("[ADMIN] {} (due {})", name, due_date),
            None => format!("[ADMIN] {}", name),
        },
        RecordFields::Decisions {
            title,
            decision,
            rationale,
            ..
        } => {
            let mut block = format!("[DECISION] {}\n{}", title, decision);
            if let Some(rationale) = rationale {
                block.push_str(&format!("\nRationale: {}", rationale));
            }
            block
        }
        RecordFields::Howtos { title, content } => format!("[HOWTO] {}\n{}", title, content),
        RecordFields::Snippets { title, content } => format!("[SNIPPET] {}\n{}", title, content),
    }
}

fn format_project_list(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "📋 No projects yet.".to_string();
    }
    let mut out = String::from("📋 Projects");
    let mut current_status: Option<&str> = None;
    for hit in hits {
        let RecordFields::Projects {
            name,
            status,
            next_action,
            ..
        } = &hit.fields
        else {
            continue;
        };
        if current_status != Some(status.as_str()) {
            out.push_str(&format!("\n\n{}", status.to_uppercase()));
            current_status = Some(status.as_str());
        }
        match next_action {
            Some(next) => out.push_str(&format!("\n• {} → {}", name, next)),
            None => out.push_str(&format!("\n• {}", name)),
        }
    }
    out
}

fn format_idea_list(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "💡 No ideas captured yet.".to_string();
    }
    let mut out = String::from("💡 Ideas");
    for hit in hits {
        let RecordFields::Ideas {
            title, one_liner, ..
        } = &hit.fields
        else {
            continue;
        };
        let date = hit.created_at.format("%b %d");
        match one_liner {
            Some(one_liner) => out.push_str(&format!("\n• {}: {} ({})", title, one_liner, date)),
            None => out.push_str(&format!("\n• {} ({})", title, date)),
        }
    }
    out
}

fn format_admin_list(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "✅ No pending admin tasks.".to_string();
    }
    let mut out = String::from("📝 Admin tasks");
    for hit in hits {
        let RecordFields::Admin {
            name, due_date, ..
        } = &hit.fields
        else {
            continue;
        };
        match due_date {
            Some(due_date) => out.push_str(&format!("\n• {} (due {})", name, due_date)),
            None => out.push_str(&format!("\n• {}", name)),
        }
    }
    out
}

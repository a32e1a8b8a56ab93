//! Chat reply text for capture outcomes.
//!
//! Every string the service sends back through the gateway is built
//! here, so the conversational surface can be reviewed in one place.

use notegate_common::Category;

/// Confirmation for a capture that was filed directly.
pub fn filed(category: Category, title: &str, confidence: f64) -> String {
    format!(
        "✓ Filed as {}: \"{}\"\nConfidence: {:.0}%\nReply `fix: <category>` if wrong.",
        category.singular(),
        title,
        confidence * 100.0
    )
}

/// Prompt asking the user to pick a category for a low-confidence capture.
pub fn clarification_prompt(suggested: Category, confidence: f64) -> String {
    format!(
        "Not sure where to file this (best guess: {} at {:.0}%).\nReply with one of: {} or `skip` to discard.",
        suggested.singular(),
        confidence * 100.0,
        token_list()
    )
}

/// Notice that classification failed and the message is parked for review.
pub fn classification_failed() -> String {
    "Couldn't classify that message; it's logged for review. Reply `fix: <category>` to file it manually.".to_string()
}

/// Confirmation for a clarification answered with a category.
pub fn resolved(category: Category, title: &str) -> String {
    format!("✓ Filed as {}: \"{}\"", category.singular(), title)
}

/// Confirmation for a clarification answered with `skip`.
pub fn discarded() -> String {
    "Discarded. The message stays in the review log only.".to_string()
}

/// Re-prompt after an unrecognized clarification reply.
pub fn clarification_retry() -> String {
    format!(
        "Didn't catch that. Reply with one of: {} or `skip` to discard.",
        token_list()
    )
}

/// Confirmation for a fix that moved (or first filed) a capture.
pub fn fixed(from: Option<Category>, to: Category, title: &str) -> String {
    match from {
        Some(from) => format!(
            "✓ Moved from {} to {}: \"{}\"",
            from.singular(),
            to.singular(),
            title
        ),
        None => format!("✓ Filed as {}: \"{}\"", to.singular(), title),
    }
}

/// Usage hint for a fix command with an unrecognized category.
pub fn fix_usage() -> String {
    format!(
        "Unknown category. Reply `fix: <category>` with one of: {}.",
        token_list()
    )
}

/// All category reply tokens, backtick-quoted and comma-separated.
fn token_list() -> String {
    Category::ALL
        .iter()
        .map(|c| format!("`{}`", c.singular()))
        .collect::<Vec<_>>()
        .join(", ")
}

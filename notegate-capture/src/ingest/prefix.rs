//! Reference prefix parsing.
//!
//! Reference categories are never classified; the user declares them with
//! a leading `decision:` / `howto:` / `snippet:` token and the body is
//! parsed into fields deterministically.

use notegate_common::records::{truncate_title, RecordFields};
use notegate_common::Category;

/// Title separators tried in order against howto and snippet bodies.
const TITLE_SEPARATORS: [&str; 4] = ["→", "->", " - ", ": "];

/// Match a leading reference prefix, case-insensitively.
///
/// Returns the category and the trimmed body after the prefix, or `None`
/// when the message carries no prefix or an empty body.
pub fn parse_reference(text: &str) -> Option<(Category, &str)> {
    let trimmed = text.trim_start();
    let prefixes = [
        ("decision:", Category::Decisions),
        ("howto:", Category::Howtos),
        ("snippet:", Category::Snippets),
    ];
    for (token, category) in prefixes {
        // get() keeps multibyte text from splitting mid-character
        let Some(head) = trimmed.get(..token.len()) else {
            continue;
        };
        if head.eq_ignore_ascii_case(token) {
            let body = trimmed[token.len()..].trim();
            if body.is_empty() {
                return None;
            }
            return Some((category, body));
        }
    }
    None
}

/// Build fields for a reference capture from its parsed body.
///
/// Returns `None` for dynamic categories, which have no deterministic
/// field extraction.
pub fn reference_fields(category: Category, body: &str) -> Option<RecordFields> {
    match category {
        Category::Decisions => Some(decision_fields(body)),
        Category::Howtos => {
            let (title, content) = split_title(body);
            Some(RecordFields::Howtos { title, content })
        }
        Category::Snippets => {
            let (title, content) = split_title(body);
            Some(RecordFields::Snippets { title, content })
        }
        _ => None,
    }
}

/// Split a decision body on the first " because ", case-insensitively.
fn decision_fields(body: &str) -> RecordFields {
    match find_because(body) {
        Some(idx) => {
            let decision = body[..idx].trim();
            let rationale = body[idx + " because ".len()..].trim();
            RecordFields::Decisions {
                title: truncate_title(decision),
                decision: decision.to_string(),
                rationale: (!rationale.is_empty()).then(|| rationale.to_string()),
                context: None,
            }
        }
        None => RecordFields::Decisions {
            title: truncate_title(body),
            decision: body.to_string(),
            rationale: None,
            context: None,
        },
    }
}

/// Byte offset of the first case-insensitive " because ", if any.
fn find_because(body: &str) -> Option<usize> {
    let needle = b" because ";
    let bytes = body.as_bytes();
    if bytes.len() < needle.len() {
        return None;
    }
    for idx in 0..=bytes.len() - needle.len() {
        if !body.is_char_boundary(idx) {
            continue;
        }
        if bytes[idx..idx + needle.len()].eq_ignore_ascii_case(needle) {
            return Some(idx);
        }
    }
    None
}

/// Split a body into (title, content) on the first recognized separator.
///
/// Falls back to a truncated-body title over the full body when no
/// separator yields two non-empty halves.
fn split_title(body: &str) -> (String, String) {
    for separator in TITLE_SEPARATORS {
        if let Some((head, tail)) = body.split_once(separator) {
            let head = head.trim();
            let tail = tail.trim();
            if !head.is_empty() && !tail.is_empty() {
                return (truncate_title(head), tail.to_string());
            }
        }
    }
    (truncate_title(body), body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_prefix_case_insensitively() {
        let (category, body) = parse_reference("decision: use sqlite because simple").unwrap();
        assert_eq!(category, Category::Decisions);
        assert_eq!(body, "use sqlite because simple");

        let (category, body) = parse_reference("HOWTO: rotate keys → run the script").unwrap();
        assert_eq!(category, Category::Howtos);
        assert_eq!(body, "rotate keys → run the script");

        let (category, _) = parse_reference("  Snippet: retry loop: loop { }").unwrap();
        assert_eq!(category, Category::Snippets);
    }

    #[test]
    fn rejects_missing_prefix_and_empty_body() {
        assert!(parse_reference("met Dana at the meetup").is_none());
        assert!(parse_reference("decision:").is_none());
        assert!(parse_reference("decision:   ").is_none());
        assert!(parse_reference("decisions: plural is not a prefix").is_none());
    }

    #[test]
    fn decision_splits_on_because() {
        let fields = decision_fields("use SQLite for storage because zero ops burden");
        match fields {
            RecordFields::Decisions {
                title,
                decision,
                rationale,
                context,
            } => {
                assert_eq!(title, "use SQLite for storage");
                assert_eq!(decision, "use SQLite for storage");
                assert_eq!(rationale.as_deref(), Some("zero ops burden"));
                assert!(context.is_none());
            }
            other => panic!("expected decision fields, got {:?}", other),
        }
    }

    #[test]
    fn decision_without_because_keeps_whole_body() {
        let fields = decision_fields("ship weekly");
        match fields {
            RecordFields::Decisions {
                decision, rationale, ..
            } => {
                assert_eq!(decision, "ship weekly");
                assert!(rationale.is_none());
            }
            other => panic!("expected decision fields, got {:?}", other),
        }
    }

    #[test]
    fn because_match_is_case_insensitive_and_first_wins() {
        assert_eq!(find_because("a BECAUSE b because c"), Some(1));
        assert!(find_because("because leading has no space").is_none());
        // multibyte text before the needle must not panic
        assert!(find_because("déjà vu all over").is_none());
    }

    #[test]
    fn title_separators_tried_in_order() {
        assert_eq!(
            split_title("rotate keys → run rotate.sh"),
            ("rotate keys".to_string(), "run rotate.sh".to_string())
        );
        assert_eq!(
            split_title("rotate keys -> run rotate.sh"),
            ("rotate keys".to_string(), "run rotate.sh".to_string())
        );
        assert_eq!(
            split_title("rotate keys - run rotate.sh"),
            ("rotate keys".to_string(), "run rotate.sh".to_string())
        );
        assert_eq!(
            split_title("rotate keys: run rotate.sh"),
            ("rotate keys".to_string(), "run rotate.sh".to_string())
        );
    }

    #[test]
    fn title_falls_back_to_truncated_body() {
        let long = "x".repeat(140);
        let (title, content) = split_title(&long);
        assert_eq!(title.chars().count(), 100);
        assert_eq!(content, long);

        // separator with an empty half falls through
        let (title, content) = split_title(": leading colon only");
        assert_eq!(title, ": leading colon only");
        assert_eq!(content, ": leading colon only");
    }
}

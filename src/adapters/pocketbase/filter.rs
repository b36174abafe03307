//! Rendering of structured filters into PocketBase filter syntax.
//!
//! PocketBase reads any quote that directly follows a backslash as escaped,
//! whatever precedes the backslash. A string value containing `\` therefore
//! cannot be placed inside a literal safely, and is never rendered.

use serde_json::Value;

use crate::ports::Filter;

/// Renders `filter` as a PocketBase filter expression, e.g.
/// `account_provider = 'github' && account_provider_account_id = '42'`.
///
/// String values are single-quoted with embedded quotes escaped as `\'`.
/// Returns `None` if any string value contains a backslash.
pub fn render_filter(filter: &Filter) -> Option<String> {
    let (expression, rest) = render_partial(filter);
    rest.is_empty().then_some(expression)
}

/// Renders the conditions PocketBase can evaluate and returns the others,
/// which the caller has to match against the fetched records itself.
pub fn render_partial(filter: &Filter) -> (String, Filter) {
    let mut rendered = Vec::new();
    let mut rest = Filter::default();

    for (field, value) in filter.conditions() {
        match render_value(value) {
            Some(literal) => rendered.push(format!("{} = {}", field, literal)),
            None => rest = rest.and_eq(field, value.clone()),
        }
    }
    (rendered.join(" && "), rest)
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

fn quote(raw: &str) -> Option<String> {
    if raw.contains('\\') {
        return None;
    }
    Some(format!("'{}'", raw.replace('\'', "\\'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::field_mapper::verification_token_filter;
    use crate::domain::auth::VerificationTokenKey;

    #[test]
    fn renders_single_equality() {
        let filter = Filter::eq("user_email", "a@x.com");
        assert_eq!(render_filter(&filter).as_deref(), Some("user_email = 'a@x.com'"));
    }

    #[test]
    fn joins_conditions_with_and() {
        let filter = Filter::eq("account_provider", "github").and_eq("account_provider_account_id", "42");
        assert_eq!(
            render_filter(&filter).as_deref(),
            Some("account_provider = 'github' && account_provider_account_id = '42'")
        );
    }

    #[test]
    fn escapes_single_quotes() {
        let filter = Filter::eq("user_email", "o'brien@x.com' || 1=1 || '");
        assert_eq!(
            render_filter(&filter).as_deref(),
            Some("user_email = 'o\\'brien@x.com\\' || 1=1 || \\''")
        );
    }

    #[test]
    fn renders_non_string_literals_bare() {
        let filter = Filter::eq("n", 3).and_eq("b", true).and_eq("x", Value::Null);
        assert_eq!(
            render_filter(&filter).as_deref(),
            Some("n = 3 && b = true && x = null")
        );
    }

    #[test]
    fn empty_filter_renders_empty() {
        assert_eq!(render_filter(&Filter::default()).as_deref(), Some(""));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Backslashes
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn trailing_backslash_is_not_rendered() {
        let key = VerificationTokenKey::new(
            "a\\",
            " || verification_token_identifier = \"victim@x.com\" //",
        );
        assert_eq!(render_filter(&verification_token_filter(&key)), None);
    }

    #[test]
    fn backslash_conditions_are_left_for_the_caller() {
        let key = VerificationTokenKey::new(
            "a\\",
            " || verification_token_identifier = \"victim@x.com\" //",
        );
        let (expression, rest) = render_partial(&verification_token_filter(&key));

        assert_eq!(
            expression,
            "verification_token_token = ' || verification_token_identifier = \"victim@x.com\" //'"
        );
        assert_eq!(
            rest,
            Filter::eq("verification_token_identifier", "a\\")
        );
    }

    #[test]
    fn backslash_anywhere_in_a_value_is_held_back() {
        let filter = Filter::eq("user_email", "a\\b@x.com");
        let (expression, rest) = render_partial(&filter);
        assert_eq!(expression, "");
        assert_eq!(rest, filter);
    }
}

//! Template handling: placeholder substitution, `$var$` normalization and
//! structural validation of expression templates.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{BatchError, Result};

/// Literal token that, when present, is the only thing substituted.
pub const DATA_TOKEN: &str = "{data}";

static BRACE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[^{}]+\}").expect("brace placeholder pattern")
});

static DOLLAR_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(.*?)\$").expect("dollar placeholder pattern")
});

/// Identifiers naming vector fields cannot be simulated as scalars and are
/// skipped before substitution.
pub fn is_vector_identifier(identifier: &str) -> bool {
    identifier.to_ascii_lowercase().contains("vector")
}

/// Binds `identifier` into `template`.
///
/// A template containing [`DATA_TOKEN`] has exactly that token replaced.
/// Otherwise the first brace-delimited placeholder is replaced, whatever
/// its name; templates are expected to carry only one. A blank result is reported as [`BatchError::EmptyExpression`].
pub fn substitute(template: &str, identifier: &str) -> Result<String> {
    let expression = if template.contains(DATA_TOKEN) {
        template.replace(DATA_TOKEN, identifier)
    } else {
        BRACE_PLACEHOLDER
            .replace(template, regex::NoExpand(identifier))
            .into_owned()
    };

    if expression.trim().is_empty() {
        return Err(BatchError::EmptyExpression {
            identifier: identifier.to_string(),
        });
    }
    Ok(expression)
}

/// Rewrites `$var$` markers into `{var}` placeholders.
pub fn normalize_placeholders(template: &str) -> String {
    if !template.contains('$') {
        return template.to_string();
    }
    DOLLAR_PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            format!("{{{}}}", caps[1].trim())
        })
        .into_owned()
}

/// Names of the placeholders in a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let normalized = normalize_placeholders(template);
    BRACE_PLACEHOLDER
        .find_iter(&normalized)
        .map(|m| m.as_str().trim_matches(['{', '}']).trim().to_string())
        .collect()
}

/// Accepts a template with exactly one placeholder and balanced brackets.
pub fn validate_template(template: &str) -> Result<()> {
    if template.trim().is_empty() {
        return Err(BatchError::InvalidTemplate("template is empty".into()));
    }

    let normalized = normalize_placeholders(template);
    let count = placeholders(&normalized).len();
    if count != 1 {
        return Err(BatchError::InvalidTemplate(format!(
            "expected exactly one placeholder, found {count}"
        )));
    }

    let mut open = Vec::new();
    for (offset, ch) in normalized.char_indices() {
        match ch {
            '(' | '[' | '{' => open.push(ch),
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if open.pop() != Some(expected) {
                    return Err(BatchError::InvalidTemplate(format!(
                        "unbalanced '{ch}' at offset {offset}"
                    )));
                }
            }
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(BatchError::InvalidTemplate(format!(
            "unclosed '{unclosed}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_token_replaces_only_the_token() {
        let out = substitute("ts_rank({data}, 20) + {other}", "close").unwrap();
        assert_eq!(out, "ts_rank(close, 20) + {other}");
    }

    #[test]
    fn named_placeholder_is_replaced() {
        assert_eq!(substitute("rank({v})", "volume").unwrap(), "rank(volume)");
        assert_eq!(
            substitute("group_neutralize({field}, industry)", "fnd6_at").unwrap(),
            "group_neutralize(fnd6_at, industry)"
        );
    }

    #[test]
    fn only_the_first_named_placeholder_is_filled() {
        assert_eq!(
            substitute("ts_corr({x}, {y}, 10)", "close").unwrap(),
            "ts_corr(close, {y}, 10)"
        );
    }

    #[test]
    fn identifier_is_inserted_literally() {
        assert_eq!(substitute("rank({v})", "a$1b").unwrap(), "rank(a$1b)");
    }

    #[test]
    fn empty_template_is_an_error() {
        let err = substitute("", "close").unwrap_err();
        assert!(matches!(err, BatchError::EmptyExpression { .. }));
    }

    #[test]
    fn template_without_placeholder_passes_through() {
        assert_eq!(substitute("rank(close)", "x").unwrap(), "rank(close)");
    }

    #[test]
    fn vector_detection_ignores_case() {
        assert!(is_vector_identifier("news_VECTOR_sent"));
        assert!(is_vector_identifier("Vector"));
        assert!(!is_vector_identifier("close"));
    }

    #[test]
    fn dollar_markers_become_braces() {
        assert_eq!(normalize_placeholders("rank($ x $)"), "rank({x})");
        assert_eq!(normalize_placeholders("rank({x})"), "rank({x})");
        assert_eq!(placeholders("ts_mean($d$, 5)"), vec!["d".to_string()]);
    }

    #[test]
    fn validation_requires_one_placeholder_and_balance() {
        assert!(validate_template("rank(ts_delta({data}, 5))").is_ok());
        assert!(validate_template("rank($x$)").is_ok());
        assert!(validate_template("rank(close)").is_err());
        assert!(validate_template("{a} + {b}").is_err());
        assert!(validate_template("rank({x}").is_err());
        assert!(validate_template("rank({x}])").is_err());
        assert!(validate_template("  ").is_err());
    }
}

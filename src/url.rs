//! Resolves a path template plus parameters into an absolute URL.

use crate::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::fmt::Write;

/// Everything outside the RFC 3986 unreserved set is percent-encoded, for
/// both path segments and query components.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Builds the final absolute URL from a base URL, a path template with
/// `{name}` placeholders, path parameters, and optional-valued query
/// parameters.
///
/// The base URL's trailing slash is trimmed and the resolved path always
/// starts with exactly one `/`, so the join never produces `//` or a missing
/// separator. Query entries with an absent value are dropped entirely; the
/// `?` is emitted only when at least one pair survives. Deterministic and
/// side-effect free.
///
/// # Errors
///
/// Returns [`Error::UrlResolution`] when the template contains a placeholder
/// with no matching path parameter.
///
/// # Examples
///
/// ```
/// use wirecall::build_url;
/// use std::collections::HashMap;
///
/// let url = build_url(
///     "https://api.test",
///     "/users/{id}",
///     &HashMap::from([("id".to_string(), "7".to_string())]),
///     &[
///         ("expand".to_string(), None),
///         ("limit".to_string(), Some("10".to_string())),
///     ],
/// )?;
/// assert_eq!(url, "https://api.test/users/7?limit=10");
/// # Ok::<(), wirecall::Error>(())
/// ```
pub fn build_url(
    base_url: &str,
    template: &str,
    path_params: &HashMap<String, String>,
    query_params: &[(String, Option<String>)],
) -> Result<String> {
    let mut path = template.to_string();
    for (name, value) in path_params {
        let token = format!("{{{name}}}");
        if path.contains(&token) {
            path = path.replace(&token, &encode(value));
        }
    }

    // Encoded substitutions never contain braces, so any survivor came from
    // the template itself.
    if let Some(open) = path.find('{') {
        let rest = &path[open + 1..];
        let placeholder = rest
            .split('}')
            .next()
            .unwrap_or(rest)
            .to_string();
        return Err(Error::UrlResolution {
            placeholder,
            template: template.to_string(),
        });
    }

    let mut url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    let mut query = String::new();
    for (name, value) in query_params {
        let Some(value) = value else { continue };
        if !query.is_empty() {
            query.push('&');
        }
        // writing to a String cannot fail
        let _ = write!(query, "{}={}", encode(name), encode(value));
    }
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolves_placeholders_and_drops_absent_query_values() {
        let url = build_url(
            "https://api.test",
            "/users/{id}",
            &params(&[("id", "7")]),
            &[
                ("expand".to_string(), None),
                ("limit".to_string(), Some("10".to_string())),
            ],
        )
        .unwrap();
        assert_eq!(url, "https://api.test/users/7?limit=10");
    }

    #[test]
    fn test_unresolved_placeholder_is_an_error() {
        let result = build_url(
            "https://api.test",
            "/users/{id}/posts/{post_id}",
            &params(&[("id", "7")]),
            &[],
        );
        match result {
            Err(Error::UrlResolution {
                placeholder,
                template,
            }) => {
                assert_eq!(placeholder, "post_id");
                assert_eq!(template, "/users/{id}/posts/{post_id}");
            }
            other => panic!("Expected UrlResolution, got {other:?}"),
        }
    }

    #[test]
    fn test_no_placeholders_no_error() {
        let url = build_url("https://api.test", "/health", &HashMap::new(), &[]).unwrap();
        assert_eq!(url, "https://api.test/health");
    }

    #[test]
    fn test_trailing_and_leading_slashes_are_normalized() {
        let with_both = build_url("https://api.test/", "/users", &HashMap::new(), &[]).unwrap();
        let with_neither = build_url("https://api.test", "users", &HashMap::new(), &[]).unwrap();
        assert_eq!(with_both, "https://api.test/users");
        assert_eq!(with_neither, "https://api.test/users");
    }

    #[test]
    fn test_path_params_are_percent_encoded() {
        let url = build_url(
            "https://api.test",
            "/search/{term}",
            &params(&[("term", "a b/c")]),
            &[],
        )
        .unwrap();
        assert_eq!(url, "https://api.test/search/a%20b%2Fc");
    }

    #[test]
    fn test_query_components_are_percent_encoded() {
        let url = build_url(
            "https://api.test",
            "/search",
            &HashMap::new(),
            &[("q".to_string(), Some("a&b=c".to_string()))],
        )
        .unwrap();
        assert_eq!(url, "https://api.test/search?q=a%26b%3Dc");
    }

    #[test]
    fn test_all_query_values_absent_emits_no_question_mark() {
        let url = build_url(
            "https://api.test",
            "/users",
            &HashMap::new(),
            &[
                ("a".to_string(), None),
                ("b".to_string(), None),
            ],
        )
        .unwrap();
        assert_eq!(url, "https://api.test/users");
    }

    #[test]
    fn test_query_preserves_insertion_order() {
        let url = build_url(
            "https://api.test",
            "/users",
            &HashMap::new(),
            &[
                ("page".to_string(), Some("1".to_string())),
                ("limit".to_string(), Some("10".to_string())),
            ],
        )
        .unwrap();
        assert_eq!(url, "https://api.test/users?page=1&limit=10");
    }

    #[test]
    fn test_empty_query_value_is_still_emitted() {
        let url = build_url(
            "https://api.test",
            "/users",
            &HashMap::new(),
            &[("filter".to_string(), Some(String::new()))],
        )
        .unwrap();
        assert_eq!(url, "https://api.test/users?filter=");
    }
}

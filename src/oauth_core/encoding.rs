//! Form and query-string helpers shared by the message codec.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};
use url::{Url, form_urlencoded};

/// Custom encode set for application/x-www-form-urlencoded allowing unreserved characters including hyphens
const FORM_URLENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encodes a string for URL safety and returns an owned `String`
///
/// # Example
/// ```
/// use starberry_oauth_client::oauth_core::encoding::encode_url_owned;
/// let encoded = encode_url_owned("Hello World!");
/// assert_eq!(encoded, "Hello%20World%21");
/// ```
pub fn encode_url_owned(input: &str) -> String {
    utf8_percent_encode(input, FORM_URLENCODE_SET).to_string()
}

/// Renders one message value as a form value.
///
/// Arrays become space separated lists (the OAuth2 convention for `scope`
/// and `response_type`). Null, empty strings and empty arrays are absent.
pub fn form_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(form_value).collect();
            if parts.is_empty() { None } else { Some(parts.join(" ")) }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Serializes a field map as `application/x-www-form-urlencoded`.
pub fn encode_form(fields: &Map<String, Value>) -> String {
    fields
        .iter()
        .filter_map(|(k, v)| form_value(v).map(|v| format!("{}={}", encode_url_owned(k), encode_url_owned(&v))))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parses an `application/x-www-form-urlencoded` string into a field map of strings.
pub fn decode_form(text: &str) -> Map<String, Value> {
    form_urlencoded::parse(text.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

/// Returns the query part of `input` when it looks like a URL, otherwise `input` itself.
///
/// Relative references such as `/cb?code=x` are split on the first `?`.
pub fn query_of(input: &str) -> String {
    if !input.contains('?') {
        return input.to_string();
    }
    match Url::parse(input) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => input
            .split_once('?')
            .map(|(_, query)| query.split('#').next().unwrap_or_default().to_string())
            .unwrap_or_default(),
    }
}

/// Appends an encoded query to an endpoint URI.
pub fn append_query(uri: &str, query: &str) -> String {
    if query.is_empty() {
        uri.to_string()
    } else if uri.contains('?') {
        format!("{}&{}", uri, query)
    } else {
        format!("{}?{}", uri, query)
    }
}

/// Serde adapter for space-delimited lists such as `scope`.
///
/// Accepts either a single string (`"read write"`) or a JSON array, and
/// always serializes back to a single string.
pub mod space_delimited {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        List(Vec<String>),
    }

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&items.join(" "))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<Repr>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Repr::Text(text)) => text.split_whitespace().map(str::to_owned).collect(),
            Some(Repr::List(items)) => items.into_iter().filter(|s| !s.is_empty()).collect(),
        })
    }
}

/// Serde adapter for optional integers that may arrive as strings (form bodies).
pub mod lenient_u64 {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(n)) => Ok(Some(n)),
            Some(Repr::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(Repr::Text(text)) => text.trim().parse().map(Some).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_skips_empty_values_and_joins_lists() {
        let fields = json!({
            "a": "x y",
            "b": "",
            "c": ["read", "write"],
            "d": null,
            "e": 3600
        });
        let encoded = encode_form(fields.as_object().unwrap());
        assert_eq!(encoded, "a=x%20y&c=read%20write&e=3600");
    }

    #[test]
    fn decode_form_handles_plus_and_bare_keys() {
        let fields = decode_form("scope=read+write&flag&redirect_uri=https%3A%2F%2Fapp.local%2Fcb");
        assert_eq!(fields["scope"], "read write");
        assert_eq!(fields["flag"], "");
        assert_eq!(fields["redirect_uri"], "https://app.local/cb");
    }

    #[test]
    fn query_of_accepts_urls_relative_refs_and_plain_queries() {
        assert_eq!(query_of("https://app.local/cb?code=abc&state=s1"), "code=abc&state=s1");
        assert_eq!(query_of("/cb?code=abc#frag"), "code=abc");
        assert_eq!(query_of("code=abc"), "code=abc");
    }

    #[test]
    fn append_query_respects_existing_query() {
        assert_eq!(append_query("https://as.example/auth", "a=1"), "https://as.example/auth?a=1");
        assert_eq!(append_query("https://as.example/auth?x=2", "a=1"), "https://as.example/auth?x=2&a=1");
        assert_eq!(append_query("https://as.example/auth", ""), "https://as.example/auth");
    }
}

//! Minimal `Cache-Control` / `Pragma` directive reading.
//!
//! Only what the built-in validators need: directive presence, an optional
//! argument, and an integer `max-age`. Directive names are matched
//! case-insensitively; all `Cache-Control` header lines are combined.

use http::HeaderMap;
use http::header::{CACHE_CONTROL, PRAGMA};
use smol_str::SmolStr;

/// A single `name[=value]` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    name: SmolStr,
    value: Option<SmolStr>,
}

impl Directive {
    /// Lowercased directive name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument with surrounding quotes removed, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Parsed `Cache-Control` directives of a request or response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    directives: Vec<Directive>,
}

impl CacheControl {
    /// Collects directives from every `Cache-Control` line in `headers`.
    /// Missing or non-UTF-8 headers yield no directives.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let directives = headers
            .get_all(CACHE_CONTROL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(parse_directives)
            .collect();
        Self { directives }
    }

    pub fn parse(value: &str) -> Self {
        Self {
            directives: parse_directives(value).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.directives
            .iter()
            .find(|directive| directive.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `max-age` in seconds. Negative values are kept as-is and values out of
    /// `i64` range saturate; an argument that is not an integer is treated as
    /// absent.
    pub fn max_age(&self) -> Option<i64> {
        self.get("max-age")
            .and_then(Directive::value)
            .and_then(parse_seconds)
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// `true` when the legacy `Pragma: no-cache` header is present.
pub fn pragma_no_cache(headers: &HeaderMap) -> bool {
    headers
        .get_all(PRAGMA)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.trim().eq_ignore_ascii_case("no-cache"))
}

/// Optional `-` followed by ASCII digits only.
fn parse_seconds(value: &str) -> Option<i64> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, value),
    };
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    match (digits.parse::<i64>(), negative) {
        (Ok(seconds), false) => Some(seconds),
        (Ok(seconds), true) => Some(-seconds),
        (Err(_), false) => Some(i64::MAX),
        (Err(_), true) => Some(i64::MIN),
    }
}

fn parse_directives(value: &str) -> impl Iterator<Item = Directive> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((name, value)) => Directive {
                name: SmolStr::new(name.trim().to_ascii_lowercase()),
                value: Some(SmolStr::new(value.trim().trim_matches('"'))),
            },
            None => Directive {
                name: SmolStr::new(token.to_ascii_lowercase()),
                value: None,
            },
        })
}

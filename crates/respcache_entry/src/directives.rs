//! Pure parsers for response `Cache-Control` directives and HTTP dates.
//!
//! Malformed input never errors: a directive that cannot be read is
//! reported as absent.

use std::time::UNIX_EPOCH;

/// Storability flags carried by a `Cache-Control` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheControlFlags {
    pub no_store: bool,
    pub no_cache: bool,
    pub private: bool,
}

pub fn parse_cache_control_flags(value: &str) -> CacheControlFlags {
    let mut flags = CacheControlFlags::default();
    for (name, _) in directives(value) {
        if name.eq_ignore_ascii_case("no-store") {
            flags.no_store = true;
        } else if name.eq_ignore_ascii_case("no-cache") {
            flags.no_cache = true;
        } else if name.eq_ignore_ascii_case("private") {
            flags.private = true;
        }
    }
    flags
}

pub fn parse_max_age(value: &str) -> Option<u64> {
    parse_seconds_directive(value, "max-age")
}

pub fn parse_s_maxage(value: &str) -> Option<u64> {
    parse_seconds_directive(value, "s-maxage")
}

/// Parse an HTTP-date (IMF-fixdate, RFC 850 or asctime) into epoch seconds.
pub fn parse_http_date(value: &str) -> Option<u64> {
    let time = httpdate::parse_http_date(value.trim()).ok()?;
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

// First occurrence wins; a malformed first occurrence means the directive is absent.
fn parse_seconds_directive(value: &str, directive: &str) -> Option<u64> {
    let (_, arg) = directives(value).find(|(name, _)| name.eq_ignore_ascii_case(directive))?;
    let arg = unquote(arg?.trim());
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    arg.parse::<u64>().ok()
}

/// Split a `Cache-Control` value into `(name, argument)` pairs.
///
/// Commas inside a quoted argument (`no-cache="Set-Cookie, Vary"`) do not
/// split directives.
fn directives(value: &str) -> impl Iterator<Item = (&str, Option<&str>)> {
    split_outside_quotes(value).into_iter().filter_map(|token| {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        match token.split_once('=') {
            Some((name, arg)) => Some((name.trim(), Some(arg.trim()))),
            None => Some((token, None)),
        }
    })
}

fn split_outside_quotes(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (idx, ch) in value.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unquote(arg: &str) -> &str {
    if arg.len() >= 2 && arg.starts_with('"') && arg.ends_with('"') {
        &arg[1..arg.len() - 1]
    } else {
        arg
    }
}

use std::time::{SystemTime, UNIX_EPOCH};

use http::StatusCode;
use tracing::debug;

use crate::{
    directives::{
        CacheControlFlags, parse_cache_control_flags, parse_http_date, parse_max_age,
        parse_s_maxage,
    },
    headers::Headers,
    policy::CachePolicy,
};

/// A stored HTTP response plus the metadata that drives reuse.
///
/// `stored_at` and `max_age` are in seconds; the entry is fresh while its age
/// is below `max_age`. Status and body never change after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub(crate) status: StatusCode,
    pub(crate) headers: Headers,
    pub(crate) body: Vec<u8>,
    pub(crate) stored_at: u64,
    pub(crate) max_age: u64,
    pub(crate) etag: Option<String>,
    pub(crate) last_modified: Option<String>,
}

impl CacheEntry {
    /// Build an entry stamped with the current system time.
    pub fn new(status: StatusCode, headers: Headers, body: Vec<u8>) -> Self {
        Self::new_at(status, headers, body, unix_now())
    }

    pub fn new_at(status: StatusCode, headers: Headers, body: Vec<u8>, now: u64) -> Self {
        Self::with_policy_at(status, headers, body, &CachePolicy::default(), now)
    }

    /// Build an entry whose freshness lifetime is read under `policy`.
    ///
    /// Missing or malformed freshness headers give a lifetime of zero.
    pub fn with_policy_at(
        status: StatusCode,
        headers: Headers,
        body: Vec<u8>,
        policy: &CachePolicy,
        now: u64,
    ) -> Self {
        let max_age = freshness_lifetime(&headers, policy.shared, now).unwrap_or(0);
        let etag = non_empty(headers.get("ETag"));
        let last_modified = non_empty(headers.get("Last-Modified"));

        Self {
            status,
            headers,
            body,
            stored_at: now,
            max_age,
            etag,
            last_modified,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn stored_at(&self) -> u64 {
        self.stored_at
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    pub fn has_validator(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }

    pub fn can_cache(&self) -> bool {
        self.can_cache_with(&CachePolicy::default())
    }

    /// Decide whether this response may be stored under `policy`.
    ///
    /// `no-cache` is always refused since stored entries are never forced
    /// through revalidation here. `private` is refused only by shared caches.
    pub fn can_cache_with(&self, policy: &CachePolicy) -> bool {
        if !policy.is_cacheable_status(self.status) {
            return self.reject("status");
        }

        let flags = self.cache_control_flags();
        if flags.no_store {
            return self.reject("no-store");
        }
        if flags.no_cache {
            return self.reject("no-cache");
        }
        if flags.private && policy.shared {
            return self.reject("private");
        }
        if self.max_age == 0 && !self.has_validator() {
            return self.reject("no freshness or validators");
        }

        true
    }

    /// Seconds since the freshness clock started. A clock behind `stored_at`
    /// counts as age zero.
    pub fn age_at(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    pub fn remaining_at(&self, now: u64) -> u64 {
        self.max_age.saturating_sub(self.age_at(now))
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        self.age_at(now) >= self.max_age
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    /// Request headers to send when revalidating this entry with the origin.
    pub fn conditional_headers(&self) -> Headers {
        let mut out = Headers::new();
        if let Some(etag) = &self.etag {
            out.append("If-None-Match", etag.clone());
        }
        if let Some(last_modified) = &self.last_modified {
            out.append("If-Modified-Since", last_modified.clone());
        }
        out
    }

    /// [`CacheEntry::revalidated_with`] under the default shared policy, so
    /// `s-maxage` applies. Single-client caches pass their own policy.
    pub fn revalidated(&self, new_headers: &Headers, now: u64) -> Self {
        self.revalidated_with(new_headers, &CachePolicy::default(), now)
    }

    /// Merge the headers of a revalidation response (typically a 304) into a
    /// copy of this entry, fresh again as of `now`.
    ///
    /// Fields the new headers do not carry, or carry in unreadable form, keep
    /// their stored values. Body and status are never replaced.
    pub fn revalidated_with(&self, new_headers: &Headers, policy: &CachePolicy, now: u64) -> Self {
        let mut next = self.clone();

        if let Some(lifetime) = freshness_lifetime(new_headers, policy.shared, now) {
            next.max_age = lifetime;
        }
        if let Some(etag) = non_empty(new_headers.get("ETag")) {
            next.etag = Some(etag);
        }
        if let Some(last_modified) = non_empty(new_headers.get("Last-Modified")) {
            next.last_modified = Some(last_modified);
        }

        let mut merged: Vec<&str> = Vec::new();
        for (name, _) in new_headers.iter() {
            if is_representation_header(name) || merged.iter().any(|m| m.eq_ignore_ascii_case(name))
            {
                continue;
            }
            merged.push(name);

            let mut values = new_headers.get_all(name).filter(|v| !v.trim().is_empty());
            if let Some(first) = values.next() {
                next.headers.insert(name, first);
            }
            for value in values {
                next.headers.append(name, value);
            }
        }

        next.stored_at = now;

        debug!(
            target: "respcache::entry",
            status = %next.status,
            max_age = next.max_age,
            etag = ?next.etag,
            stored_at = next.stored_at,
            "Entry revalidated"
        );
        next
    }

    /// In-place merge as a shared cache, timed by the system clock.
    pub fn update_with_response(&mut self, new_headers: &Headers) {
        self.update_with_response_at(new_headers, unix_now());
    }

    pub fn update_with_response_at(&mut self, new_headers: &Headers, now: u64) {
        self.update_with_response_with(new_headers, &CachePolicy::default(), now);
    }

    pub fn update_with_response_with(
        &mut self,
        new_headers: &Headers,
        policy: &CachePolicy,
        now: u64,
    ) {
        *self = self.revalidated_with(new_headers, policy, now);
    }

    fn cache_control_flags(&self) -> CacheControlFlags {
        if let Some(cache_control) = self.headers.get_joined("Cache-Control") {
            return parse_cache_control_flags(&cache_control);
        }
        // Pragma only matters for HTTP/1.0 origins that omit Cache-Control.
        let no_cache = self.headers.get_all("Pragma").any(|pragma| {
            pragma
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("no-cache"))
        });
        CacheControlFlags {
            no_cache,
            ..CacheControlFlags::default()
        }
    }

    fn reject(&self, reason: &'static str) -> bool {
        debug!(
            target: "respcache::policy",
            status = %self.status,
            reason,
            "Response not cacheable"
        );
        false
    }
}

/// Freshness lifetime carried by `headers`, if any.
///
/// `s-maxage` (shared caches only) beats `max-age`, which beats
/// `Expires - Date`. Without a readable `Date` the lifetime counts from `now`.
fn freshness_lifetime(headers: &Headers, shared: bool, now: u64) -> Option<u64> {
    if let Some(cache_control) = headers.get_joined("Cache-Control") {
        if shared && let Some(s_maxage) = parse_s_maxage(&cache_control) {
            return Some(s_maxage);
        }
        if let Some(max_age) = parse_max_age(&cache_control) {
            return Some(max_age);
        }
    }

    let expires = parse_http_date(headers.get("Expires")?)?;
    let date = headers.get("Date").and_then(parse_http_date).unwrap_or(now);
    Some(expires.saturating_sub(date))
}

// Headers describing the stored body; a 304 must not rewrite them.
fn is_representation_header(name: &str) -> bool {
    ["Content-Length", "Content-Encoding", "Content-Range", "Transfer-Encoding"]
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

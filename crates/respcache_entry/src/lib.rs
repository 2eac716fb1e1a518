//! HTTP response cache entries: storability, freshness and revalidation.
//!
//! A [`CacheEntry`] holds one stored response. It answers whether the
//! response may be cached ([`CacheEntry::can_cache`]), whether it is still
//! fresh ([`CacheEntry::is_expired_at`]), and folds revalidation responses
//! back in ([`CacheEntry::revalidated`]). Entries persist through
//! [`CacheEntry::encode`] / [`CacheEntry::decode`].
//!
//! Storage, eviction and network I/O belong to the caller.

pub mod codec;
pub mod directives;
pub mod entry;
pub mod error;
pub mod headers;
pub mod policy;

#[cfg(test)]
mod property_tests;

pub use directives::{
    CacheControlFlags, parse_cache_control_flags, parse_http_date, parse_max_age, parse_s_maxage,
};
pub use entry::{CacheEntry, unix_now};
pub use error::{DecodeError, EncodeError};
pub use headers::Headers;
pub use policy::CachePolicy;

use http::StatusCode;

/// Storage rules applied when deciding whether a response may be cached.
///
/// A shared cache (the default) refuses `private` responses and honors
/// `s-maxage`. A single-client cache stores `private` responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    pub shared: bool,
    pub cacheable_statuses: Vec<StatusCode>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            shared: true,
            cacheable_statuses: Self::default_statuses(),
        }
    }
}

impl CachePolicy {
    pub fn shared() -> Self {
        Self::default()
    }

    pub fn single_client() -> Self {
        Self {
            shared: false,
            ..Self::default()
        }
    }

    pub fn default_statuses() -> Vec<StatusCode> {
        vec![StatusCode::OK, StatusCode::NON_AUTHORITATIVE_INFORMATION]
    }

    pub fn is_cacheable_status(&self, status: StatusCode) -> bool {
        self.cacheable_statuses.contains(&status)
    }
}

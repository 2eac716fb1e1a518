use http::StatusCode;
use respcache_entry::CachePolicy;
use serde::Deserialize;

mod validation;

pub use validation::{ConfigReport, validate};

// =======================================================
// CACHE CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// Shared caches refuse `private` responses and honor `s-maxage`.
    pub shared: bool,
    /// Comma-separated status codes eligible for storage, e.g. `"200,203"`.
    pub cacheable_statuses: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shared: true,
            cacheable_statuses: "200,203".into(),
        }
    }
}

impl CacheConfig {
    pub fn shared(&self) -> bool {
        self.shared
    }

    pub fn cacheable_statuses(&self) -> &str {
        &self.cacheable_statuses
    }

    /// Status codes from `cacheable_statuses`; unreadable tokens are skipped
    /// (`validate` reports them).
    pub fn statuses(&self) -> Vec<StatusCode> {
        status_tokens(&self.cacheable_statuses)
            .filter_map(|token| token.parse::<u16>().ok())
            .filter_map(|code| StatusCode::from_u16(code).ok())
            .collect()
    }

    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            shared: self.shared,
            cacheable_statuses: self.statuses(),
        }
    }
}

pub(crate) fn status_tokens(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|t| !t.is_empty())
}

// =======================================================
// LOG CONFIG + DEFAULTS
// =======================================================
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl LogConfig {
    pub fn level(&self) -> &str {
        &self.level
    }
}

// =======================================================
// ROOT CONFIG
// =======================================================
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RespcacheConfig {
    pub cache: CacheConfig,
    pub log: LogConfig,
}

impl RespcacheConfig {
    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    pub fn log(&self) -> &LogConfig {
        &self.log
    }

    pub fn policy(&self) -> CachePolicy {
        self.cache.policy()
    }

    /// Load an INI config file. A missing file yields the defaults.
    pub fn from_file(file_name: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::new(file_name, config::FileFormat::Ini).required(false))
            .build()?;

        let mut cfg: RespcacheConfig = built.try_deserialize()?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    pub fn from_ini_str(contents: &str) -> Result<Self, config::ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Ini))
            .build()?;

        let mut cfg: RespcacheConfig = built.try_deserialize()?;

        cfg.apply_defaults();
        Ok(cfg)
    }

    fn apply_defaults(&mut self) {
        let def_cache = CacheConfig::default();
        if self.cache.cacheable_statuses.trim().is_empty() {
            self.cache.cacheable_statuses = def_cache.cacheable_statuses;
        }

        let def_log = LogConfig::default();
        if self.log.level.trim().is_empty() {
            self.log.level = def_log.level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RespcacheConfig;
    use http::StatusCode;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = RespcacheConfig::from_ini_str("").expect("empty ini parses");
        assert!(cfg.cache().shared());
        assert_eq!(cfg.cache().cacheable_statuses(), "200,203");
        assert_eq!(cfg.log().level(), "info");
        assert_eq!(
            cfg.policy().cacheable_statuses,
            vec![StatusCode::OK, StatusCode::NON_AUTHORITATIVE_INFORMATION]
        );
    }

    #[test]
    fn reads_cache_and_log_sections() {
        let cfg = RespcacheConfig::from_ini_str(
            "[cache]\nshared = false\ncacheable_statuses = 200, 206\n\n[log]\nlevel = debug\n",
        )
        .expect("valid ini");
        let policy = cfg.policy();
        assert!(!policy.shared);
        assert_eq!(
            policy.cacheable_statuses,
            vec![StatusCode::OK, StatusCode::PARTIAL_CONTENT]
        );
        assert_eq!(cfg.log().level(), "debug");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = RespcacheConfig::from_ini_str("[cache]\ncacheable_statuses =\n[log]\nlevel =\n")
            .expect("valid ini");
        assert_eq!(cfg.cache().cacheable_statuses(), "200,203");
        assert_eq!(cfg.log().level(), "info");
    }

    #[test]
    fn unreadable_statuses_are_skipped() {
        let cfg = RespcacheConfig::from_ini_str("[cache]\ncacheable_statuses = 200,abc,42,,203\n")
            .expect("valid ini");
        assert_eq!(
            cfg.cache().statuses(),
            vec![StatusCode::OK, StatusCode::NON_AUTHORITATIVE_INFORMATION]
        );
    }

    #[test]
    fn missing_file_uses_defaults() {
        let cfg = RespcacheConfig::from_file("does-not-exist-respcache.conf")
            .expect("optional file");
        assert!(cfg.cache().shared());
    }
}

use crate::{RespcacheConfig, status_tokens};

/// Validation output for a loaded configuration.
#[derive(Debug, Default)]
pub struct ConfigReport {
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl ConfigReport {
    /// Returns true when no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Render warnings and errors into a readable, multi-line string.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for err in &self.errors {
                out.push_str("  - ");
                out.push_str(err);
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Warnings:\n");
            for warn in &self.warnings {
                out.push_str("  - ");
                out.push_str(warn);
                out.push('\n');
            }
        }
        out
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validate a configuration and return a report of issues.
pub fn validate(cfg: &RespcacheConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    validate_statuses(cfg, &mut report);
    validate_log(cfg, &mut report);

    report
}

fn validate_statuses(cfg: &RespcacheConfig, report: &mut ConfigReport) {
    let list = cfg.cache.cacheable_statuses.as_str();
    let mut has_ok = false;
    let mut count = 0;

    for token in status_tokens(list) {
        count += 1;
        let Ok(code) = token.parse::<u16>() else {
            report.error(format!(
                "cache.cacheable_statuses entry '{token}' is not a status code"
            ));
            continue;
        };
        if !(100..=599).contains(&code) {
            report.error(format!(
                "cache.cacheable_statuses entry {code} is outside 100..=599"
            ));
            continue;
        }

        match code {
            200 => has_ok = true,
            206 => report.warn(
                "cache.cacheable_statuses includes 206; partial bodies are stored as-is and never combined",
            ),
            200..=299 => {}
            _ => report.warn(format!(
                "cache.cacheable_statuses includes non-success status {code}"
            )),
        }
    }

    if count == 0 {
        report.error("cache.cacheable_statuses is empty; nothing would ever be stored");
    } else if !has_ok {
        report.error("cache.cacheable_statuses must include 200");
    }
}

fn validate_log(cfg: &RespcacheConfig, report: &mut ConfigReport) {
    let level = cfg.log.level.trim();
    let known = ["trace", "debug", "info", "warn", "error", "off"];
    if !level.contains('=') && !known.iter().any(|k| k.eq_ignore_ascii_case(level)) {
        report.warn(format!(
            "log.level '{level}' is not a known level; it is passed to the filter unchanged"
        ));
    }
}

use respcache_config::{RespcacheConfig, validate};
use tracing::warn;
use utils::init_tracing;

mod commands;
mod response;

use commands::Command;

const DEFAULT_CONFIG: &str = "respcache.conf";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("RESPCACHE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let loaded = RespcacheConfig::from_file(&config_path);

    let level = match &loaded {
        Ok(cfg) => cfg.log().level().to_string(),
        Err(_) => "info".to_string(),
    };
    init_tracing(&level);

    let cfg = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(target: "respcache::config", path = %config_path, error = %e, "Error reading config; using defaults");
            RespcacheConfig::default()
        }
    };

    let report = validate(&cfg);
    for warning in report.warnings() {
        warn!(target: "respcache::config", "{warning}");
    }
    if !report.is_ok() {
        anyhow::bail!("invalid config '{config_path}':\n{}", report.format());
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let summary = Command::parse(&args)?.run(&cfg.policy()).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

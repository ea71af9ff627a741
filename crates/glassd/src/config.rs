use std::path::Path;

use anyhow::{Context, bail};

use glass_model::Config;

/// Read, parse and validate the daemon configuration.
pub fn load(path: &Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&raw).with_context(|| format!("loading config file {}", path.display()))
}

pub fn parse(raw: &str) -> anyhow::Result<Config> {
    let cfg: Config = serde_yaml::from_str(raw).context("parsing YAML")?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> anyhow::Result<()> {
    if cfg.listen.tls {
        bail!("listen.tls is not supported, terminate TLS in a reverse proxy");
    }
    if cfg.rate_limit.enabled {
        if cfg.rate_limit.max_commands == 0 {
            bail!("rate_limit.max_commands must be positive when rate limiting is enabled");
        }
        if cfg.rate_limit.time_window == 0 {
            bail!("rate_limit.time_window must be positive when rate limiting is enabled");
        }
    }
    let dns = &cfg.dns;
    if dns.endpoints.is_empty() {
        bail!("dns.endpoints must not be empty");
    }
    for (key, value) in [
        ("dns.query_timeout_ms", dns.query_timeout_ms),
        ("dns.resolve_timeout_ms", dns.resolve_timeout_ms),
        ("dns.probe_interval_secs", dns.probe_interval_secs),
    ] {
        if value == 0 {
            bail!("{key} must be positive");
        }
    }
    for t in cfg.commands.iter() {
        if t.template.trim().is_empty() {
            bail!("command {:?} has an empty template", t.name);
        }
    }
    Ok(())
}

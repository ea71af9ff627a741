use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use glass_api::{GlassAdapter, HttpApi};
use glass_core::RateLimiter;
use glass_dns::DnsResolver;
use glass_exec::Launcher;
use glass_observe::{LoggerConfig, init_logger};

mod cli;
mod config;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1) Config
    let cfg = config::load(&cli.config)?;
    if cli.check {
        println!("{}: ok, {} commands", cli.config.display(), cfg.commands.len());
        return Ok(());
    }

    // 2) Logger
    let level = cli.log_level.as_deref().unwrap_or(&cfg.listen.log_level);
    let log_cfg = LoggerConfig::from_parts(&cfg.listen.log_format, level)?;
    init_logger(&log_cfg)?;
    info!(config = %cli.config.display(), commands = cfg.commands.len(), "configuration loaded");

    // 3) Resolver + background prober
    let resolver = Arc::new(DnsResolver::new(&cfg.dns).context("building DNS resolver")?);
    let cancel = CancellationToken::new();
    let prober = resolver.spawn_prober(cancel.clone());

    // 4) Launcher, limiter, API
    let launcher = Launcher::new(Arc::new(cfg.commands), resolver);
    let limiter = Arc::new(RateLimiter::new(&cfg.rate_limit));
    if !limiter.is_enabled() {
        warn!("rate limiting is disabled");
    }
    let adapter = Arc::new(GlassAdapter::new(launcher, limiter, cfg.info));
    let router = HttpApi::new(adapter).router();

    // 5) Serve until signalled
    let addr = format!("{}:{}", cfg.listen.host, cfg.listen.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    info!("shutting down...");
    cancel.cancel();
    if let Err(e) = prober.await {
        warn!(error = %e, "dns prober ended abnormally");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use anyhow::{anyhow, Context, Result};
use bhavcopy::{
    cleanup::CleanupOutcome, fetch::HttpArchiveSource, prompt::StdinPrompt, Config, Pipeline,
};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn run() -> Result<bool> {
    let config = Config::load().context("loading configuration")?;
    let source = HttpArchiveSource::new(&config.user_agent, config.request_timeout())
        .map_err(|e| anyhow!("building HTTP client: {e}"))?;
    let mut pipeline = Pipeline::new(config, source, StdinPrompt::new());

    match pipeline.run() {
        Ok(summary) => {
            if let CleanupOutcome::Failed { reason } = &summary.cleanup {
                warn!(reason = %reason, "working directory left behind");
            }
            info!(
                code = %summary.code,
                records = summary.records,
                matched = summary.matched,
                "done"
            );
            Ok(true)
        }
        Err(e) => {
            error!(stage = %e.stage, error = %e.source, "run aborted");
            eprintln!("❌ {}", e.source);
            Ok(false)
        }
    }
}

fn main() -> ExitCode {
    // ─── init logging ────────────────────────────────────────────────
    let env =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,bhavcopy=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

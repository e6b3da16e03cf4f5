use anyhow::Context;
use busforge::args::Args;
use busforge::{config, logger, runner};
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = config::load(args.config.as_deref())?;
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(config.logging().level());
    logger::setup_logger(level, config.logging().file()).context("Failed to set up logging")?;

    // Ctrl+C abandons the current step of the run; what exists gets rolled back
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cleaning up what was created so far");
            signal_token.cancel();
        }
    });

    let outcome = runner::run(&config, &args, cancel).await.inspect_err(|e| {
        log::error!("{e}");
    })?;

    if let Some(error) = outcome.error {
        return Err(anyhow::Error::new(error)
            .context("Run failed, created resources were rolled back"));
    }
    if outcome.teardown.as_ref().is_some_and(|report| !report.is_clean()) {
        anyhow::bail!("Clean up finished with errors, check the log for resources left behind");
    }
    Ok(())
}

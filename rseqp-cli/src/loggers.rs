use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over the default level; `verbose` lowers the default from
/// `info` to `debug`. With `json` the events are written as JSON lines.
/// Logs go to stderr so results can be piped from stdout.
pub fn init_logger(verbose: bool, json: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "info" };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());
    let layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_names(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry().with(layer).with(env_filter).try_init()?;

    Ok(())
}

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize structured JSON logging on stderr.
///
/// Defaults to `info` level unless overridden by `ASSETPIPE_LOG`. Stdout stays free for
/// command output (the metadata document, for instance).
pub fn init() {
    let filter = EnvFilter::builder()
        .with_env_var("ASSETPIPE_LOG")
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directives used when `RUST_LOG` is unset. Channel internals log per
/// partition at debug, so only the routing summary is on by default.
const DEFAULT_DIRECTIVES: &str = "info,txnq_cluster=warn";

/// Install the process-wide subscriber for the coordinator and its tools.
///
/// `log` records from both workspace crates are bridged into `tracing`, and
/// events carry the emitting thread id so sender tasks and routing callers
/// can be told apart. Repeat calls keep the first subscriber.
pub fn init() {
    let _ = LogTracer::init();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Silence everything so instrumented routing paths cost nothing in benches.
pub fn init_for_benchmarks() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("off"))
        .try_init();
}

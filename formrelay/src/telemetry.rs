use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const METRICS_PREFIX: &str = "formrelay";

#[derive(thiserror::Error, Debug)]
pub enum MetricsInitError {
    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    AlreadyInstalled,
}

/// Installs the global tracing subscriber, plus the Sentry client when a DSN is configured.
///
/// The returned guard flushes pending Sentry events when dropped and must be
/// held for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config
        .sentry_dsn
        .as_deref()
        .filter(|dsn| !dsn.is_empty())
        .map(str::parse::<sentry::types::Dsn>);

    let (guard, dsn_error) = match dsn {
        Some(Ok(dsn)) => {
            let guard = sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                ..Default::default()
            });
            (Some(guard), None)
        }
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_deref().unwrap_or("info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            guard
                .as_ref()
                .map(|_| sentry::integrations::tracing::layer()),
        )
        .init();

    if let Some(e) = dsn_error {
        tracing::warn!(error = %e, "Invalid Sentry DSN, error reporting disabled");
    }

    guard
}

/// Routes the `metrics` facade to statsd.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsInitError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;

    metrics::set_global_recorder(recorder).map_err(|_| MetricsInitError::AlreadyInstalled)?;
    shared::metrics_defs::describe_all(relay::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}

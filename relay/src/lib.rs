pub mod body;
pub mod config;
pub mod cors;
pub mod errors;
pub mod forward;
pub mod metrics_defs;
pub mod normalize;
pub mod response;
pub mod service;
pub mod signature;

#[cfg(test)]
mod testutils;

use errors::RelayError;
use service::RelayService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;

/// Serves the relay and its admin endpoints until either listener fails.
pub async fn run(config: config::Config) -> Result<(), RelayError> {
    let is_ready = config.relay.downstream_url.is_some();
    if !is_ready {
        tracing::warn!("ZFLOW_URL not set, submissions will be answered with 500");
    }

    let relay_service = RelayService::new(config.relay.clone());
    let admin_service: AdminService<_, RelayError> = AdminService::new(move || is_ready);

    let relay_task = run_http_service(&config.listener.host, config.listener.port, relay_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(relay_task, admin_task)?;
    Ok(())
}

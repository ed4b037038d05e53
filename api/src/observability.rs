use anyhow::Result;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;
use crate::metrics;

pub struct Observability {
    pub registry: Registry,
}

impl Observability {
    pub fn init(format: LogFormat) -> Result<Self> {
        let registry = Registry::new_custom(Some("helpdesk".into()), None)?;
        metrics::register_all(&registry)?;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "api=debug,tower_http=debug".into());

        match format {
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()?,
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?,
        }

        tracing::info!(?format, "Observability stack initialized (Prometheus + tracing)");
        Ok(Self { registry })
    }
}

pub async fn request_logger(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics::observe_http(method.as_str(), &path, status, elapsed.as_secs_f64());

    tracing::info!("{method} {uri} {status} {}ms", elapsed.as_millis());

    response
}

use prometheus::Registry;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::repository::PgLookup;
use crate::validation::{EntityLookup, RouteGuard, ValidationChain};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub started_at: Instant,
    pub registry: Registry,
    pub config: Arc<AppConfig>,
    pub lookup: Arc<dyn EntityLookup>,
}

impl AppState {
    pub fn new(db: PgPool, registry: Registry, config: AppConfig) -> Self {
        let lookup = Arc::new(PgLookup::new(db.clone()));
        Self::with_lookup(db, registry, config, lookup)
    }

    /// State whose entity checks use `lookup` instead of the database
    pub fn with_lookup(
        db: PgPool,
        registry: Registry,
        config: AppConfig,
        lookup: Arc<dyn EntityLookup>,
    ) -> Self {
        Self {
            db,
            started_at: Instant::now(),
            registry,
            config: Arc::new(config),
            lookup,
        }
    }

    /// Guard running `chain` against this state's lookup
    pub fn guard(&self, chain: ValidationChain) -> RouteGuard {
        RouteGuard::new(chain, self.lookup.clone(), self.config.max_body_bytes)
    }
}

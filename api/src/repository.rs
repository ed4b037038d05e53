use std::time::Instant;

use async_trait::async_trait;
use shared::{Client, Contact, Ticket};
use sqlx::PgPool;

use crate::metrics;
use crate::validation::{EntityLookup, LookupError};

pub(crate) const CLIENT_COLUMNS: &str = "id, name, email_domain, created_at";
pub(crate) const CONTACT_COLUMNS: &str = "id, client_id, name, email, phone, created_at";
pub(crate) const TICKET_COLUMNS: &str =
    "id, client_id, contact_id, title, description, state, created_at, updated_at";

/// Entity lookups served from PostgreSQL
#[derive(Clone)]
pub struct PgLookup {
    pool: PgPool,
}

impl PgLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_id<T>(&self, table: &str, columns: &str, id: i64) -> Result<Option<T>, LookupError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", columns, table);
        let started = Instant::now();

        let result = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

        let label = format!("{}_by_id", table);
        metrics::observe_db_query(&label, started.elapsed().as_secs_f64(), result.is_ok());

        result.map_err(|err| {
            tracing::error!(table, id, error = ?err, "entity lookup query failed");
            LookupError::from(err)
        })
    }
}

#[async_trait]
impl EntityLookup for PgLookup {
    async fn find_client(&self, id: i64) -> Result<Option<Client>, LookupError> {
        self.find_by_id("clients", CLIENT_COLUMNS, id).await
    }

    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, LookupError> {
        self.find_by_id("contacts", CONTACT_COLUMNS, id).await
    }

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>, LookupError> {
        self.find_by_id("tickets", TICKET_COLUMNS, id).await
    }
}

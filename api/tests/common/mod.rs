#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api::config::AppConfig;
use api::routes::build_router;
use api::state::AppState;
use api::validation::{EntityLookup, LookupError};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use prometheus::Registry;
use serde_json::Value;
use shared::{Client, Contact, Ticket};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

/// Fixture data:
/// - client 1 (Acme), client 2 (Globex)
/// - contact 7 belongs to client 1, contact 8 to client 2
/// - ticket 1 for client 1, ticket 2 for client 2
/// - any lookup of id 13 fails
#[derive(Default)]
pub struct MemoryLookup {
    clients: HashMap<i64, Client>,
    contacts: HashMap<i64, Contact>,
    tickets: HashMap<i64, Ticket>,
    failing: HashSet<i64>,
    calls: AtomicUsize,
    tickets_seen: Mutex<Vec<i64>>,
}

impl MemoryLookup {
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut lookup = MemoryLookup::default();

        for (id, name, domain) in [(1, "Acme", "acme.com"), (2, "Globex", "globex.com")] {
            lookup.clients.insert(
                id,
                Client {
                    id,
                    name: name.to_string(),
                    email_domain: Some(domain.to_string()),
                    created_at: now,
                },
            );
        }

        for (id, client_id, name) in [(7, 1, "Riley"), (8, 2, "Morgan")] {
            lookup.contacts.insert(
                id,
                Contact {
                    id,
                    client_id,
                    name: name.to_string(),
                    email: None,
                    phone: None,
                    created_at: now,
                },
            );
        }

        for (id, client_id, contact_id, title) in [
            (1, 1, 7, "Printer offline"),
            (2, 2, 8, "Mailbox full"),
        ] {
            lookup.tickets.insert(
                id,
                Ticket {
                    id,
                    client_id,
                    contact_id: Some(contact_id),
                    title: title.to_string(),
                    description: None,
                    state: "open".to_string(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        lookup.failing.insert(13);
        lookup
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ticket ids passed to `find_ticket`, in call order
    pub fn tickets_seen(&self) -> Vec<i64> {
        self.tickets_seen.lock().unwrap().clone()
    }

    fn record(&self, id: i64) -> Result<(), LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&id) {
            return Err(LookupError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityLookup for MemoryLookup {
    async fn find_client(&self, id: i64) -> Result<Option<Client>, LookupError> {
        self.record(id)?;
        Ok(self.clients.get(&id).cloned())
    }

    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, LookupError> {
        self.record(id)?;
        Ok(self.contacts.get(&id).cloned())
    }

    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>, LookupError> {
        self.tickets_seen.lock().unwrap().push(id);
        self.record(id)?;
        Ok(self.tickets.get(&id).cloned())
    }
}

pub fn test_app(lookup: Arc<MemoryLookup>) -> Router {
    test_app_with(lookup, AppConfig::for_database("postgres://localhost/helpdesk_test"))
}

pub fn test_app_with(lookup: Arc<MemoryLookup>, config: AppConfig) -> Router {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let registry = Registry::new_custom(Some("test".into()), None).unwrap();
    api::metrics::register_all(&registry).unwrap();

    build_router(AppState::with_lookup(pool, registry, config, lookup))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

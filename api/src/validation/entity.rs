//! Checks that resolve an id from the request and confirm the record exists.
//!
//! The checks distinguish two outcomes of a lookup:
//! - the store answered "no such record": a [`Rejection`] (404 / 400)
//! - the store could not answer: a [`LookupError`], left to the global error layer

use async_trait::async_trait;
use serde_json::Value;
use shared::{Client, Contact, Ticket};
use thiserror::Error;

use super::checks::is_positive_integer;
use super::context::{AttachedEntity, Pass, RequestContext};
use super::outcome::{Rejection, ValidationError};
use super::spec::{EntityKind, IdSource};
use crate::metrics;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the records the entity checks depend on.
///
/// Implementations are shared by all in-flight requests.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn find_client(&self, id: i64) -> Result<Option<Client>, LookupError>;
    async fn find_contact(&self, id: i64) -> Result<Option<Contact>, LookupError>;
    async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>, LookupError>;
}

/// Outcome of reading an id out of the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedId {
    Missing,
    Invalid,
    Id(i64),
}

/// Read the id named by `source`.
///
/// A body source falls back to its path parameter when the body field is
/// absent. Null and `""` count as absent. A path source never looks at the body.
pub fn resolve_id(source: &IdSource, ctx: &RequestContext) -> ResolvedId {
    let param = match source {
        IdSource::Body { field, fallback_param } => {
            match ctx.body_field(field) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if s.is_empty() => {}
                Some(value) => return id_from_value(value),
            }
            fallback_param.as_deref()
        }
        IdSource::Path(param) => Some(param.as_str()),
    };

    match param.and_then(|p| ctx.param(p)) {
        None | Some("") => ResolvedId::Missing,
        Some(raw) => id_from_str(raw),
    }
}

/// Body ids must be JSON integers or digit strings; `1.0` is invalid
fn id_from_value(value: &Value) -> ResolvedId {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(id) if id > 0 => ResolvedId::Id(id),
            _ => ResolvedId::Invalid,
        },
        Value::String(s) => id_from_str(s.trim()),
        _ => ResolvedId::Invalid,
    }
}

fn id_from_str(raw: &str) -> ResolvedId {
    if !is_positive_integer(raw) {
        return ResolvedId::Invalid;
    }
    raw.parse::<i64>()
        .map(ResolvedId::Id)
        .unwrap_or(ResolvedId::Invalid)
}

/// Resolve an id or produce the matching 400
fn require_id(source: &IdSource, ctx: &RequestContext) -> Result<i64, Rejection> {
    match resolve_id(source, ctx) {
        ResolvedId::Id(id) => Ok(id),
        ResolvedId::Missing => Err(Rejection::validation(format!(
            "{} is required",
            source.field_name()
        ))),
        ResolvedId::Invalid => Err(Rejection::validation(format!(
            "{} must be a positive integer",
            source.field_name()
        ))),
    }
}

async fn fetch(
    kind: EntityKind,
    id: i64,
    lookup: &dyn EntityLookup,
) -> Result<Option<AttachedEntity>, LookupError> {
    let found = match kind {
        EntityKind::Client => lookup.find_client(id).await.map(|e| e.map(AttachedEntity::Client)),
        EntityKind::Contact => lookup.find_contact(id).await.map(|e| e.map(AttachedEntity::Contact)),
        EntityKind::Ticket => lookup.find_ticket(id).await.map(|e| e.map(AttachedEntity::Ticket)),
    };

    let result = match &found {
        Ok(Some(_)) => "found",
        Ok(None) => "missing",
        Err(_) => "error",
    };
    metrics::observe_lookup(kind.label(), result);

    found
}

fn not_found(kind: EntityKind, id: i64) -> Rejection {
    Rejection::not_found(format!("{} with ID {} not found", kind.display_name(), id))
}

/// The referenced record must exist; on success it is attached for the handler
pub async fn check_exists(
    kind: EntityKind,
    source: &IdSource,
    ctx: &RequestContext,
    lookup: &dyn EntityLookup,
) -> Result<Pass, ValidationError> {
    let id = require_id(source, ctx)?;

    match fetch(kind, id, lookup).await? {
        Some(entity) => Ok(Pass::Attach(entity)),
        None => Err(not_found(kind, id).into()),
    }
}

/// The referenced contact must exist and be owned by the referenced client
pub async fn check_contact_belongs_to_client(
    contact_source: &IdSource,
    client_source: &IdSource,
    ctx: &RequestContext,
    lookup: &dyn EntityLookup,
) -> Result<Pass, ValidationError> {
    let contact_id = require_id(contact_source, ctx)?;
    let client_id = require_id(client_source, ctx)?;

    let contact = match fetch(EntityKind::Contact, contact_id, lookup).await? {
        Some(AttachedEntity::Contact(contact)) => contact,
        _ => return Err(not_found(EntityKind::Contact, contact_id).into()),
    };

    if contact.client_id != client_id {
        tracing::debug!(
            contact_id,
            client_id,
            owner = contact.client_id,
            "contact belongs to a different client"
        );
        return Err(Rejection::validation("Contact does not belong to specified client").into());
    }

    Ok(Pass::Attach(AttachedEntity::Contact(contact)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RejectionKind;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One contact (id 7, owned by client 1); optionally failing
    struct FakeLookup {
        calls: AtomicUsize,
        broken: bool,
    }

    impl FakeLookup {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0), broken: false }
        }

        fn broken() -> Self {
            Self { calls: AtomicUsize::new(0), broken: true }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EntityLookup for FakeLookup {
        async fn find_client(&self, _id: i64) -> Result<Option<Client>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn find_contact(&self, id: i64) -> Result<Option<Contact>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(LookupError::Unavailable("connection refused".into()));
            }
            Ok((id == 7).then(|| Contact {
                id: 7,
                client_id: 1,
                name: "Riley".into(),
                email: Some("riley@acme.com".into()),
                phone: None,
                created_at: Utc::now(),
            }))
        }

        async fn find_ticket(&self, _id: i64) -> Result<Option<Ticket>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    fn contact_source() -> IdSource {
        IdSource::body("contactId")
    }

    #[test]
    fn test_resolve_id_precedence() {
        let source = IdSource::Body {
            field: "contactId".to_string(),
            fallback_param: Some("id".to_string()),
        };

        let body_wins = RequestContext::new(json!({ "contactId": 4 })).with_param("id", "9");
        assert_eq!(resolve_id(&source, &body_wins), ResolvedId::Id(4));

        let param_fallback = RequestContext::new(json!({ "contactId": null })).with_param("id", "9");
        assert_eq!(resolve_id(&source, &param_fallback), ResolvedId::Id(9));

        let numeric_string = RequestContext::new(json!({ "contactId": "12" }));
        assert_eq!(resolve_id(&source, &numeric_string), ResolvedId::Id(12));

        assert_eq!(resolve_id(&source, &RequestContext::default()), ResolvedId::Missing);

        let garbage = RequestContext::new(json!({ "contactId": "twelve" }));
        assert_eq!(resolve_id(&source, &garbage), ResolvedId::Invalid);

        let negative = RequestContext::new(json!({ "contactId": -3 }));
        assert_eq!(resolve_id(&source, &negative), ResolvedId::Invalid);

        let whole_float = RequestContext::new(json!({ "contactId": 1.0 }));
        assert_eq!(resolve_id(&source, &whole_float), ResolvedId::Invalid);
    }

    #[test]
    fn test_path_source_ignores_body() {
        let source = IdSource::path("id");

        let conflicting = RequestContext::new(json!({ "id": 2, "ticketId": 2 })).with_param("id", "1");
        assert_eq!(resolve_id(&source, &conflicting), ResolvedId::Id(1));

        let body_only = RequestContext::new(json!({ "id": 2 }));
        assert_eq!(resolve_id(&source, &body_only), ResolvedId::Missing);
    }

    #[tokio::test]
    async fn test_missing_id_skips_lookup() {
        let lookup = FakeLookup::new();
        let err = check_exists(EntityKind::Contact, &contact_source(), &RequestContext::default(), &lookup)
            .await
            .unwrap_err();

        let rejection = err.rejection().unwrap();
        assert_eq!(rejection.kind, RejectionKind::Validation);
        assert_eq!(rejection.message, "contactId is required");
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let lookup = FakeLookup::new();
        let ctx = RequestContext::default().with_param("id", "42");
        let err = check_exists(EntityKind::Contact, &IdSource::path("id"), &ctx, &lookup)
            .await
            .unwrap_err();

        let rejection = err.rejection().unwrap();
        assert_eq!(rejection.kind, RejectionKind::NotFound);
        assert_eq!(rejection.message, "Contact with ID 42 not found");
    }

    #[tokio::test]
    async fn test_found_entity_is_attached() {
        let lookup = FakeLookup::new();
        let ctx = RequestContext::new(json!({ "contactId": 7 }));
        let pass = check_exists(EntityKind::Contact, &contact_source(), &ctx, &lookup)
            .await
            .unwrap();

        match pass {
            Pass::Attach(AttachedEntity::Contact(contact)) => assert_eq!(contact.id, 7),
            other => panic!("unexpected pass: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let lookup = FakeLookup::broken();
        let ctx = RequestContext::new(json!({ "contactId": 7 }));
        let err = check_exists(EntityKind::Contact, &contact_source(), &ctx, &lookup)
            .await
            .unwrap_err();

        assert!(matches!(err, ValidationError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_contact_client_membership() {
        let lookup = FakeLookup::new();
        let client = IdSource::body("clientId");

        let same = RequestContext::new(json!({ "contactId": 7, "clientId": 1 }));
        assert!(check_contact_belongs_to_client(&contact_source(), &client, &same, &lookup)
            .await
            .is_ok());

        let other = RequestContext::new(json!({ "contactId": 7, "clientId": 2 }));
        let err = check_contact_belongs_to_client(&contact_source(), &client, &other, &lookup)
            .await
            .unwrap_err();
        let rejection = err.rejection().unwrap();
        assert_eq!(rejection.kind, RejectionKind::Validation);
        assert_eq!(rejection.message, "Contact does not belong to specified client");

        let no_client = RequestContext::new(json!({ "contactId": 7 }));
        let err = check_contact_belongs_to_client(&contact_source(), &client, &no_client, &lookup)
            .await
            .unwrap_err();
        assert_eq!(err.rejection().unwrap().message, "clientId is required");
    }
}

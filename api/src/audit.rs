//! Audit trail for ticket writes
//!
//! Audit events go through `tracing` under the `audit` target, so they can be
//! routed or filtered on their own (`RUST_LOG=audit=info`).

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const AUDIT_TARGET: &str = "audit";

/// Header naming the person or integration behind a request
pub const ACTOR_HEADER: &str = "x-actor";

const ANONYMOUS: &str = "anonymous";
const MAX_ACTOR_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    TicketCreated,
    TicketStateChanged,
    TimeEntryLogged,
    TicketCreatedFromEmail,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::TicketCreated => "ticket.created",
            AuditAction::TicketStateChanged => "ticket.state_changed",
            AuditAction::TimeEntryLogged => "ticket.time_entry_logged",
            AuditAction::TicketCreatedFromEmail => "ticket.created_from_email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
        }
    }
}

/// Who made the request, from the `x-actor` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    fn from_header(value: Option<&str>) -> Self {
        let name = value.map(str::trim).filter(|v| !v.is_empty());
        match name {
            Some(name) => Actor(name.chars().take(MAX_ACTOR_LEN).collect()),
            None => Actor(ANONYMOUS.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(Actor::from_header(header))
    }
}

/// One audited write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub actor: String,
    pub entity_id: Option<i64>,
    pub outcome: AuditOutcome,
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, actor: &Actor) -> Self {
        Self {
            action,
            actor: actor.as_str().to_string(),
            entity_id: None,
            outcome: AuditOutcome::Success,
            detail: None,
        }
    }

    pub fn entity(mut self, id: Option<i64>) -> Self {
        self.entity_id = id;
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Success or failure of the write this event describes
    pub fn outcome_of<T, E>(mut self, result: &Result<T, E>) -> Self {
        self.outcome = match result {
            Ok(_) => AuditOutcome::Success,
            Err(_) => AuditOutcome::Failure,
        };
        self
    }

    pub fn emit(&self) {
        tracing::info!(
            target: AUDIT_TARGET,
            action = self.action.as_str(),
            actor = %self.actor,
            entity_id = self.entity_id,
            outcome = self.outcome.as_str(),
            detail = self.detail.as_deref(),
            "audit"
        );
    }
}

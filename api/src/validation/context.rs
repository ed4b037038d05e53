//! Per-request inputs and accumulated results of a validation chain.

use std::collections::HashMap;

use serde_json::Value;
use shared::{Client, Contact, Ticket};

use super::spec::EntityKind;

/// What the checkers see of a request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Parsed JSON body; a non-object body behaves like an empty one
    pub body: Value,
    pub query: HashMap<String, String>,
    pub params: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            query: HashMap::new(),
            params: HashMap::new(),
        }
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    /// Top-level body field, if the key exists
    pub fn body_field(&self, name: &str) -> Option<&Value> {
        self.body.as_object().and_then(|map| map.get(name))
    }

    /// Walk a dotted path (`timeEntry.duration`) through nested body objects
    pub fn body_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.body;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

#[cfg(test)]
impl RequestContext {
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

/// A record fetched by an entity check
#[derive(Debug, Clone, PartialEq)]
pub enum AttachedEntity {
    Client(Client),
    Contact(Contact),
    Ticket(Ticket),
}

impl AttachedEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            AttachedEntity::Client(_) => EntityKind::Client,
            AttachedEntity::Contact(_) => EntityKind::Contact,
            AttachedEntity::Ticket(_) => EntityKind::Ticket,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            AttachedEntity::Client(c) => c.id,
            AttachedEntity::Contact(c) => c.id,
            AttachedEntity::Ticket(t) => t.id,
        }
    }
}

/// Result of a single checker that let the request through
#[derive(Debug, Clone, PartialEq)]
pub enum Pass {
    Proceed,
    Attach(AttachedEntity),
}

/// Records attached by the entity checks of one request.
///
/// Built by the chain runner and handed to handlers through request
/// extensions; dropped with the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedEntities {
    client: Option<Client>,
    contact: Option<Contact>,
    ticket: Option<Ticket>,
}

impl ValidatedEntities {
    pub fn attach(&mut self, entity: AttachedEntity) {
        match entity {
            AttachedEntity::Client(c) => self.client = Some(c),
            AttachedEntity::Contact(c) => self.contact = Some(c),
            AttachedEntity::Ticket(t) => self.ticket = Some(t),
        }
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Client => self.client.is_some(),
            EntityKind::Contact => self.contact.is_some(),
            EntityKind::Ticket => self.ticket.is_some(),
        }
    }

    /// Attach keys of everything present, e.g. `validatedContact`
    pub fn keys(&self) -> Vec<&'static str> {
        [EntityKind::Client, EntityKind::Contact, EntityKind::Ticket]
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .map(|kind| kind.attach_key())
            .collect()
    }
}

//! Route validation descriptors
//!
//! A [`ValidationSpec`] is built once when routes are registered and shared
//! read-only by every request to that route. It never holds request data.

use serde_json::Value;

/// Expected runtime type of a body field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::Object => "object",
            TypeTag::Array => "array",
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the JSON type a value actually has
pub fn runtime_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Domain records an entity check can fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Client,
    Contact,
    Ticket,
}

impl EntityKind {
    /// Name used in user-facing messages
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Client => "Client",
            EntityKind::Contact => "Contact",
            EntityKind::Ticket => "Ticket",
        }
    }

    /// Key the fetched record is published under for handlers
    pub fn attach_key(&self) -> &'static str {
        match self {
            EntityKind::Client => "validatedClient",
            EntityKind::Contact => "validatedContact",
            EntityKind::Ticket => "validatedTicket",
        }
    }

    /// Conventional body field carrying this entity's id
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Client => "clientId",
            EntityKind::Contact => "contactId",
            EntityKind::Ticket => "ticketId",
        }
    }

    /// Metrics label
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Contact => "contact",
            EntityKind::Ticket => "ticket",
        }
    }
}

/// Where an entity id is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// Body field, falling back to a path parameter when the body has none
    Body {
        field: String,
        fallback_param: Option<String>,
    },
    /// Path parameter only; nothing in the body can override it
    Path(String),
}

impl IdSource {
    pub fn body(field: impl Into<String>) -> Self {
        IdSource::Body {
            field: field.into(),
            fallback_param: None,
        }
    }

    pub fn path(param: impl Into<String>) -> Self {
        IdSource::Path(param.into())
    }

    /// Name used in rejection messages
    pub fn field_name(&self) -> &str {
        match self {
            IdSource::Body { field, .. } => field,
            IdSource::Path(param) => param,
        }
    }
}

/// One checker's configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationSpec {
    /// Dotted body paths that must hold a non-null, non-empty value
    RequiredFields(Vec<String>),
    /// Expected types for body fields, checked only when present
    TypeMap(Vec<(String, TypeTag)>),
    /// Allowed values for a body (or, failing that, query) field
    Enum { field: String, allowed: Vec<String> },
    /// Path parameters that must be positive integers when present
    NumericParams(Vec<String>),
    /// The referenced record must exist; it is attached on success
    EntityExists { kind: EntityKind, source: IdSource },
    /// The referenced contact must exist and belong to the referenced client
    ContactBelongsToClient { contact: IdSource, client: IdSource },
}

impl ValidationSpec {
    pub fn required<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidationSpec::RequiredFields(paths.into_iter().map(Into::into).collect())
    }

    pub fn types<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeTag)>,
        S: Into<String>,
    {
        ValidationSpec::TypeMap(
            fields
                .into_iter()
                .map(|(field, tag)| (field.into(), tag))
                .collect(),
        )
    }

    pub fn one_of<I, S>(field: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidationSpec::Enum {
            field: field.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn numeric_params<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidationSpec::NumericParams(params.into_iter().map(Into::into).collect())
    }

    pub fn exists(kind: EntityKind, source: IdSource) -> Self {
        ValidationSpec::EntityExists { kind, source }
    }

    pub fn contact_belongs_to_client(contact: IdSource, client: IdSource) -> Self {
        ValidationSpec::ContactBelongsToClient { contact, client }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ValidationSpec::RequiredFields(_) => "required_fields",
            ValidationSpec::TypeMap(_) => "types",
            ValidationSpec::Enum { .. } => "enum",
            ValidationSpec::NumericParams(_) => "numeric_params",
            ValidationSpec::EntityExists { .. } => "entity_exists",
            ValidationSpec::ContactBelongsToClient { .. } => "contact_belongs_to_client",
        }
    }
}

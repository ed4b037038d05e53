//! Request Validation Module
//!
//! Route-level request shape validation for the helpdesk API.
//!
//! # Overview
//!
//! Every guarded route owns a [`ValidationChain`]: an ordered list of
//! [`ValidationSpec`] checkers built once at startup.
//!
//! 1. **Pure checkers** - required fields, field types, enum membership and
//!    numeric path parameters (`checks`)
//! 2. **Entity checkers** - confirm a referenced client, contact or ticket
//!    exists through an [`EntityLookup`] and attach it (`entity`)
//! 3. **Glue** - the chain runner, the axum route layer and the
//!    [`Validated<T>`] extractor handlers use to receive attached records
//!
//! The first failing checker ends the chain and the handler never runs.
//!
//! # Usage
//!
//! ```ignore
//! let guard = RouteGuard::new(rules::ticket_by_id(), lookup, max_body_bytes);
//! Router::new().route(
//!     "/api/tickets/:id",
//!     get(get_ticket).route_layer(middleware::from_fn_with_state(guard, validate_request)),
//! );
//!
//! pub async fn get_ticket(Validated(ticket): Validated<Ticket>) -> Json<Ticket> {
//!     Json(ticket)
//! }
//! ```
//!
//! # Error Response
//!
//! ```json
//! {
//!   "error": "ValidationError",
//!   "message": "Missing required fields: contactId, title",
//!   "errors": [
//!     {"field": "contactId", "message": "is required"},
//!     {"field": "title", "message": "is required"}
//!   ],
//!   "code": 400,
//!   "timestamp": "2026-02-20T10:30:00Z",
//!   "correlation_id": "uuid-here"
//! }
//! ```
//!
//! Missing records answer 404 with `"error": "NotFound"`. A lookup that fails
//! outright answers 500 and is never reported as a validation failure.

pub mod chain;
pub mod checks;
pub mod context;
pub mod entity;
pub mod extractors;
pub mod middleware;
pub mod outcome;
pub mod rules;
pub mod spec;

// Re-export commonly used items
pub use chain::ValidationChain;
pub use checks::{check_enum, check_numeric_params, check_required, check_types, is_positive_integer};
pub use context::{AttachedEntity, Pass, RequestContext, ValidatedEntities};
pub use entity::{
    check_contact_belongs_to_client, check_exists, resolve_id, EntityLookup, LookupError,
    ResolvedId,
};
pub use extractors::{AttachableEntity, Validated};
pub use middleware::{validate_request, RouteGuard};
pub use outcome::{FieldError, Rejection, RejectionKind, ValidationBuilder, ValidationError};
pub use spec::{runtime_type, EntityKind, IdSource, TypeTag, ValidationSpec};

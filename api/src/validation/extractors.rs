//! Custom Axum extractors for records attached by route validation
//!
//! `Validated<T>` hands a handler the record an entity check already fetched,
//! so the handler never repeats the lookup.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use shared::{Client, Contact, Ticket};

use super::context::ValidatedEntities;
use super::spec::EntityKind;
use crate::error::ApiError;

/// Records that an entity check can attach
pub trait AttachableEntity: Sized {
    const KIND: EntityKind;

    fn from_entities(entities: &ValidatedEntities) -> Option<Self>;
}

impl AttachableEntity for Client {
    const KIND: EntityKind = EntityKind::Client;

    fn from_entities(entities: &ValidatedEntities) -> Option<Self> {
        entities.client().cloned()
    }
}

impl AttachableEntity for Contact {
    const KIND: EntityKind = EntityKind::Contact;

    fn from_entities(entities: &ValidatedEntities) -> Option<Self> {
        entities.contact().cloned()
    }
}

impl AttachableEntity for Ticket {
    const KIND: EntityKind = EntityKind::Ticket;

    fn from_entities(entities: &ValidatedEntities) -> Option<Self> {
        entities.ticket().cloned()
    }
}

/// A record fetched by the route's entity check
///
/// # Example
///
/// ```ignore
/// pub async fn get_ticket(Validated(ticket): Validated<Ticket>) -> Json<Ticket> {
///     Json(ticket)
/// }
/// ```
///
/// Using it on a route whose chain does not attach `T` is a wiring bug and
/// answers 500.
pub struct Validated<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Validated<T>
where
    T: AttachableEntity + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ValidatedEntities>()
            .and_then(T::from_entities)
            .map(Validated)
            .ok_or_else(|| {
                tracing::error!(
                    key = T::KIND.attach_key(),
                    "handler expects an entity the route does not validate"
                );
                ApiError::internal("Request was not validated")
            })
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::AttachedEntity;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;

    fn ticket() -> Ticket {
        Ticket {
            id: 5,
            client_id: 1,
            contact_id: None,
            title: "VPN down".into(),
            description: None,
            state: "open".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_extracts_attached_entity() {
        let mut entities = ValidatedEntities::default();
        entities.attach(AttachedEntity::Ticket(ticket()));

        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(entities);

        let Validated(found) = Validated::<Ticket>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found.id, 5);
    }

    #[tokio::test]
    async fn test_missing_entity_is_internal_error() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(ValidatedEntities::default());

        let err = Validated::<Client>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Validation chains for every guarded API route
//!
//! Each function returns the checkers for one route, in the order they run.

use shared::TicketState;

use super::chain::ValidationChain;
use super::spec::{EntityKind, IdSource, TypeTag, ValidationSpec};

/// Path parameter carrying the primary record id
const ID_PARAM: &str = "id";

fn ticket_states() -> Vec<&'static str> {
    TicketState::ALL.iter().map(|s| s.as_str()).collect()
}

fn id_param() -> ValidationSpec {
    ValidationSpec::numeric_params([ID_PARAM])
}

/// The record named by the URL; the body cannot redirect it
fn exists_by_path(kind: EntityKind) -> ValidationSpec {
    ValidationSpec::exists(kind, IdSource::path(ID_PARAM))
}

// ─────────────────────────────────────────────────────────────────────────────
// Clients & contacts
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/clients/:id` and `GET /api/clients/:id/contacts`
pub fn client_by_id() -> ValidationChain {
    ValidationChain::new()
        .with(id_param())
        .with(exists_by_path(EntityKind::Client))
}

/// `GET /api/contacts/:id`
pub fn contact_by_id() -> ValidationChain {
    ValidationChain::new()
        .with(id_param())
        .with(exists_by_path(EntityKind::Contact))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tickets
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/tickets`
pub fn list_tickets() -> ValidationChain {
    ValidationChain::new().with(ValidationSpec::one_of("state", ticket_states()))
}

/// `POST /api/tickets`
pub fn create_ticket() -> ValidationChain {
    ValidationChain::new()
        .with(ValidationSpec::required(["clientId", "contactId", "title"]))
        .with(ValidationSpec::types([
            ("clientId", TypeTag::Integer),
            ("contactId", TypeTag::Integer),
            ("title", TypeTag::String),
            ("description", TypeTag::String),
        ]))
        .with(ValidationSpec::one_of("state", ticket_states()))
        .with(ValidationSpec::exists(
            EntityKind::Client,
            IdSource::body(EntityKind::Client.id_field()),
        ))
        .with(ValidationSpec::contact_belongs_to_client(
            IdSource::body(EntityKind::Contact.id_field()),
            IdSource::body(EntityKind::Client.id_field()),
        ))
}

/// `GET /api/tickets/:id`
pub fn ticket_by_id() -> ValidationChain {
    ValidationChain::new()
        .with(id_param())
        .with(exists_by_path(EntityKind::Ticket))
}

/// `PUT /api/tickets/:id/state`
pub fn update_ticket_state() -> ValidationChain {
    ValidationChain::new()
        .with(id_param())
        .with(ValidationSpec::required(["state"]))
        .with(ValidationSpec::one_of("state", ticket_states()))
        .with(exists_by_path(EntityKind::Ticket))
}

// ─────────────────────────────────────────────────────────────────────────────
// Time entries
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/tickets/:id/time-entries`
pub fn create_time_entry() -> ValidationChain {
    ValidationChain::new()
        .with(id_param())
        .with(ValidationSpec::required(["timeEntry.duration"]))
        .with(ValidationSpec::types([("timeEntry", TypeTag::Object)]))
        .with(exists_by_path(EntityKind::Ticket))
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound email
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/tickets/from-email`
pub fn ticket_from_email() -> ValidationChain {
    ValidationChain::new()
        .with(ValidationSpec::required(["senderEmail", "subject"]))
        .with(ValidationSpec::types([
            ("senderEmail", TypeTag::String),
            ("subject", TypeTag::String),
            ("body", TypeTag::String),
        ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{EntityLookup, LookupError, RequestContext};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use shared::{Client, Contact, Ticket};

    /// Every ticket id exists
    struct AnyTicket;

    #[async_trait]
    impl EntityLookup for AnyTicket {
        async fn find_client(&self, _id: i64) -> Result<Option<Client>, LookupError> {
            Ok(None)
        }

        async fn find_contact(&self, _id: i64) -> Result<Option<Contact>, LookupError> {
            Ok(None)
        }

        async fn find_ticket(&self, id: i64) -> Result<Option<Ticket>, LookupError> {
            Ok(Some(Ticket {
                id,
                client_id: 1,
                contact_id: None,
                title: "VPN down".into(),
                description: None,
                state: "open".into(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        }
    }

    #[tokio::test]
    async fn test_ticket_writes_follow_the_url_id() {
        let ctx = RequestContext::new(json!({
            "state": "closed",
            "ticketId": 2,
            "timeEntry": { "duration": "1:30" }
        }))
        .with_param("id", "1");

        for chain in [update_ticket_state(), create_time_entry()] {
            let entities = chain.run(&ctx, &AnyTicket).await.unwrap();
            assert_eq!(entities.ticket().map(|t| t.id), Some(1));
        }
    }

    #[test]
    fn test_create_ticket_checks_shape_before_lookups() {
        let chain = create_ticket();
        let names: Vec<&str> = chain.specs().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "required_fields",
                "types",
                "enum",
                "entity_exists",
                "contact_belongs_to_client"
            ]
        );
    }

    #[test]
    fn test_path_routes_validate_id_first() {
        for chain in [client_by_id(), contact_by_id(), ticket_by_id(), create_time_entry()] {
            assert_eq!(chain.specs()[0], ValidationSpec::numeric_params(["id"]));
        }
    }

    #[test]
    fn test_state_enum_lists_all_states() {
        assert_eq!(
            list_tickets().specs()[0],
            ValidationSpec::one_of("state", ["open", "closed"])
        );
    }
}

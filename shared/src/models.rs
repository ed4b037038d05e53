use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ═══════════════════════════════════════════════════════════════════════════
// CUSTOMER RECORDS
// ═══════════════════════════════════════════════════════════════════════════

/// A customer business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
    /// Mail domain used to route inbound emails to this client
    pub email_domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A person at a client business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    /// Owning client
    pub client_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════════
// TICKETS & TIME TRACKING
// ═══════════════════════════════════════════════════════════════════════════

/// A support ticket raised for a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub client_id: i64,
    pub contact_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Open,
    Closed,
}

impl TicketState {
    pub const ALL: [TicketState; 2] = [TicketState::Open, TicketState::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Open => "open",
            TicketState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billable work logged against a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: i64,
    pub ticket_id: i64,
    pub minutes: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════════
// REQUEST BODIES
// ═══════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/tickets`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub client_id: i64,
    pub contact_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: Option<TicketState>,
}

/// Body of `PUT /api/tickets/:id/state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTicketStateRequest {
    pub state: TicketState,
}

/// Body of `POST /api/tickets/:id/time-entries`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeEntryRequest {
    pub time_entry: TimeEntryInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryInput {
    /// Free-form duration such as `1h 30m`, `1:30` or `1.5`
    pub duration: String,
    pub description: Option<String>,
}

/// Body of `POST /api/tickets/from-email`, sent by the mail add-in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTicketRequest {
    pub sender_email: String,
    pub subject: String,
    pub body: Option<String>,
}

/// Query params for `GET /api/tickets`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketListParams {
    pub state: Option<TicketState>,
    pub limit: Option<i64>,
}

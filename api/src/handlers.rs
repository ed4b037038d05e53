use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use shared::{
    extract_email_domain, is_public_domain, normalize_address, Client, Contact,
    CreateTicketRequest, CreateTimeEntryRequest, EmailTicketRequest, Ticket, TicketListParams,
    TicketState, TimeEntry, UpdateTicketStateRequest, WorkDuration,
};

use crate::{
    audit::{Actor, AuditAction, AuditEvent},
    error::{ApiError, ApiResult},
    repository::{CLIENT_COLUMNS, CONTACT_COLUMNS, TICKET_COLUMNS},
    state::AppState,
    validation::Validated,
};

const DEFAULT_TICKET_PAGE: i64 = 50;
const MAX_TICKET_PAGE: i64 = 200;

fn db_internal_error(operation: &str, err: sqlx::Error) -> ApiError {
    tracing::error!(operation = operation, error = ?err, "database operation failed");
    ApiError::internal("An unexpected database error occurred")
}

fn map_json_rejection(err: JsonRejection) -> ApiError {
    ApiError::bad_request("ValidationError", format!("Invalid JSON payload: {}", err.body_text()))
}

fn map_query_rejection(err: QueryRejection) -> ApiError {
    ApiError::bad_request("ValidationError", format!("Invalid query parameters: {}", err.body_text()))
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    let now = chrono::Utc::now().to_rfc3339();

    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    if db_ok {
        tracing::info!(uptime_secs = uptime, "health check passed");
        (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": now,
                "uptime_secs": uptime
            })),
        )
    } else {
        tracing::warn!(uptime_secs = uptime, "health check degraded, db unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": now,
                "uptime_secs": uptime
            })),
        )
    }
}

// ── Clients & contacts ──────────────────────────────────────────────────────

pub async fn get_client(Validated(client): Validated<Client>) -> Json<Client> {
    Json(client)
}

pub async fn list_client_contacts(
    State(state): State<AppState>,
    Validated(client): Validated<Client>,
) -> ApiResult<Json<Vec<Contact>>> {
    let sql = format!(
        "SELECT {} FROM contacts WHERE client_id = $1 ORDER BY name",
        CONTACT_COLUMNS
    );
    let contacts = sqlx::query_as::<_, Contact>(&sql)
        .bind(client.id)
        .fetch_all(&state.db)
        .await
        .map_err(|err| db_internal_error("list client contacts", err))?;

    Ok(Json(contacts))
}

pub async fn get_contact(Validated(contact): Validated<Contact>) -> Json<Contact> {
    Json(contact)
}

// ── Tickets ─────────────────────────────────────────────────────────────────

pub async fn list_tickets(
    State(state): State<AppState>,
    params: Result<Query<TicketListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let Query(params) = params.map_err(map_query_rejection)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_TICKET_PAGE)
        .clamp(1, MAX_TICKET_PAGE);
    let state_filter = params.state.map(|s| s.as_str());

    let sql = format!(
        "SELECT {} FROM tickets WHERE ($1::text IS NULL OR state = $1) ORDER BY created_at DESC LIMIT $2",
        TICKET_COLUMNS
    );
    let tickets = sqlx::query_as::<_, Ticket>(&sql)
        .bind(state_filter)
        .bind(limit)
        .fetch_all(&state.db)
        .await
        .map_err(|err| db_internal_error("list tickets", err))?;

    Ok(Json(tickets))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    actor: Actor,
    Validated(client): Validated<Client>,
    Validated(contact): Validated<Contact>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let Json(req) = payload.map_err(map_json_rejection)?;
    let ticket_state = req.state.unwrap_or(TicketState::Open);

    let result = insert_ticket(
        &state,
        client.id,
        Some(contact.id),
        req.title.trim(),
        req.description.as_deref(),
        ticket_state,
    )
    .await;

    AuditEvent::new(AuditAction::TicketCreated, &actor)
        .entity(result.as_ref().ok().map(|t| t.id))
        .detail(format!("client {}", client.id))
        .outcome_of(&result)
        .emit();

    let ticket = result?;
    tracing::info!(ticket_id = ticket.id, client_id = client.id, "ticket created");
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn get_ticket(Validated(ticket): Validated<Ticket>) -> Json<Ticket> {
    Json(ticket)
}

pub async fn update_ticket_state(
    State(state): State<AppState>,
    actor: Actor,
    Validated(ticket): Validated<Ticket>,
    payload: Result<Json<UpdateTicketStateRequest>, JsonRejection>,
) -> ApiResult<Json<Ticket>> {
    let Json(req) = payload.map_err(map_json_rejection)?;

    let sql = format!(
        "UPDATE tickets SET state = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
        TICKET_COLUMNS
    );
    let result = sqlx::query_as::<_, Ticket>(&sql)
        .bind(req.state.as_str())
        .bind(ticket.id)
        .fetch_one(&state.db)
        .await
        .map_err(|err| db_internal_error("update ticket state", err));

    AuditEvent::new(AuditAction::TicketStateChanged, &actor)
        .entity(Some(ticket.id))
        .detail(format!("{} -> {}", ticket.state, req.state))
        .outcome_of(&result)
        .emit();

    let updated = result?;
    tracing::info!(ticket_id = ticket.id, from = %ticket.state, to = %req.state, "ticket state changed");
    Ok(Json(updated))
}

// ── Time entries ────────────────────────────────────────────────────────────

pub async fn create_time_entry(
    State(state): State<AppState>,
    actor: Actor,
    Validated(ticket): Validated<Ticket>,
    payload: Result<Json<CreateTimeEntryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(req) = payload.map_err(map_json_rejection)?;

    let duration = WorkDuration::parse(&req.time_entry.duration).map_err(|err| {
        ApiError::bad_request("ValidationError", format!("timeEntry.duration: {}", err))
    })?;
    let minutes = i32::try_from(duration.minutes).map_err(|_| {
        ApiError::bad_request("ValidationError", "timeEntry.duration: duration is too long")
    })?;

    let result = sqlx::query_as::<_, TimeEntry>(
        r#"
        INSERT INTO time_entries (ticket_id, minutes, description)
        VALUES ($1, $2, $3)
        RETURNING id, ticket_id, minutes, description, created_at
        "#,
    )
    .bind(ticket.id)
    .bind(minutes)
    .bind(req.time_entry.description.as_deref())
    .fetch_one(&state.db)
    .await
    .map_err(|err| db_internal_error("create time entry", err));

    AuditEvent::new(AuditAction::TimeEntryLogged, &actor)
        .entity(Some(ticket.id))
        .detail(format!("{} min", minutes))
        .outcome_of(&result)
        .emit();

    let entry = result?;
    tracing::info!(ticket_id = ticket.id, minutes, "time entry logged");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "timeEntry": entry,
            "hours": duration.hours(),
        })),
    ))
}

// ── Inbound email ───────────────────────────────────────────────────────────

/// Open a ticket for an email forwarded by the mail add-in.
///
/// The sender is matched to a known contact first, then to a client by mail domain.
pub async fn create_ticket_from_email(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<EmailTicketRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let Json(req) = payload.map_err(map_json_rejection)?;

    let result = open_ticket_from_email(&state, &req).await;

    AuditEvent::new(AuditAction::TicketCreatedFromEmail, &actor)
        .entity(result.as_ref().ok().map(|t| t.id))
        .detail(format!("sender {}", req.sender_email.trim()))
        .outcome_of(&result)
        .emit();

    Ok((StatusCode::CREATED, Json(result?)))
}

async fn open_ticket_from_email(state: &AppState, req: &EmailTicketRequest) -> ApiResult<Ticket> {
    let invalid_sender =
        |err: shared::EmailError| ApiError::bad_request("ValidationError", format!("senderEmail: {}", err));
    let address = normalize_address(&req.sender_email).map_err(invalid_sender)?;
    let domain = extract_email_domain(&address).map_err(invalid_sender)?;

    let contact_sql = format!(
        "SELECT {} FROM contacts WHERE lower(email) = $1 ORDER BY id LIMIT 1",
        CONTACT_COLUMNS
    );
    let contact = sqlx::query_as::<_, Contact>(&contact_sql)
        .bind(&address)
        .fetch_optional(&state.db)
        .await
        .map_err(|err| db_internal_error("find contact by email", err))?;

    let (client_id, contact_id) = match contact {
        Some(contact) => (contact.client_id, Some(contact.id)),
        None => {
            if is_public_domain(&domain) {
                return Err(ApiError::not_found(
                    "NotFound",
                    format!("No contact matches {} and {} is a public mail provider", address, domain),
                ));
            }

            let client_sql = format!(
                "SELECT {} FROM clients WHERE lower(email_domain) = $1 ORDER BY id LIMIT 1",
                CLIENT_COLUMNS
            );
            let client = sqlx::query_as::<_, Client>(&client_sql)
                .bind(&domain)
                .fetch_optional(&state.db)
                .await
                .map_err(|err| db_internal_error("find client by domain", err))?
                .ok_or_else(|| {
                    ApiError::not_found("NotFound", format!("No client matches sender domain {}", domain))
                })?;
            (client.id, None)
        }
    };

    let ticket = insert_ticket(
        state,
        client_id,
        contact_id,
        req.subject.trim(),
        req.body.as_deref(),
        TicketState::Open,
    )
    .await?;

    tracing::info!(ticket_id = ticket.id, client_id, domain = %domain, "ticket created from email");
    Ok(ticket)
}

async fn insert_ticket(
    state: &AppState,
    client_id: i64,
    contact_id: Option<i64>,
    title: &str,
    description: Option<&str>,
    ticket_state: TicketState,
) -> ApiResult<Ticket> {
    let sql = format!(
        "INSERT INTO tickets (client_id, contact_id, title, description, state) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        TICKET_COLUMNS
    );
    sqlx::query_as::<_, Ticket>(&sql)
        .bind(client_id)
        .bind(contact_id)
        .bind(title)
        .bind(description)
        .bind(ticket_state.as_str())
        .fetch_one(&state.db)
        .await
        .map_err(|err| db_internal_error("insert ticket", err))
}

pub async fn route_not_found() -> ApiError {
    ApiError::not_found("NotFound", "The requested resource was not found")
}

//! HTTP route handlers for the Barnabas chat API.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use crate::chat::core::errors::ChatError;
use crate::chat::core::ids::SessionId;
use crate::chat::core::message::UserMessage;
use crate::chat::core::persona::{GospelClarity, Persona};
use crate::chat::usage::{Pricing, UsageEstimate};
use crate::export::{ExportFormat, export_transcript};

use super::state::{AppState, SessionEntry, SharedSession};

/// Error half of every handler result.
type ApiError = (StatusCode, String);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>, static_dir: &FsPath) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/personas", get(list_personas))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/persona", put(select_persona))
        .route("/api/sessions/{id}/messages", post(post_message))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .route("/api/sessions/{id}/export/{format}", get(export_session))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "barnabas-chat",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.engine.model_name(),
        "sessions": state.sessions.len(),
    }))
}

fn chat_error(err: ChatError) -> ApiError {
    let status = match &err {
        ChatError::UnknownPersona(_) | ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
        ChatError::Completion(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::warn!(error = %err, "request failed");
    }
    (status, err.to_string())
}

fn session_not_found(id: SessionId) -> ApiError {
    (StatusCode::NOT_FOUND, format!("unknown session {id}"))
}

fn lookup(state: &AppState, id: SessionId) -> Result<SharedSession, ApiError> {
    state.session(&id).ok_or_else(|| session_not_found(id))
}

/// Persona metadata for display.
#[derive(Debug, Serialize)]
pub struct PersonaDto {
    /// Catalog key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Tone descriptor.
    pub tone: String,
    /// Long-form description.
    pub description: String,
    /// Opening assistant prompt.
    pub starting_prompt: String,
    /// Candidate follow-up questions.
    pub follow_ups: Vec<String>,
    /// Emotionally healthy classification.
    pub emotionally_healthy: bool,
    /// Gospel clarity level.
    pub gospel_clarity_level: GospelClarity,
    /// Suggested external resources.
    pub resources: Vec<String>,
}

impl From<&Persona> for PersonaDto {
    fn from(p: &Persona) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            tone: p.tone.clone(),
            description: p.description.clone(),
            starting_prompt: p.starting_prompt.clone(),
            follow_ups: p.follow_ups.clone(),
            emotionally_healthy: p.emotionally_healthy,
            gospel_clarity_level: p.gospel_clarity_level,
            resources: p.resources.clone(),
        }
    }
}

/// Persona catalog response.
#[derive(Debug, Serialize)]
pub struct PersonasResponse {
    /// Personas in catalog order.
    pub personas: Vec<PersonaDto>,
    /// Rates used for cost estimates.
    pub pricing: Pricing,
}

/// List the persona catalog.
async fn list_personas(State(state): State<Arc<AppState>>) -> Json<PersonasResponse> {
    Json(PersonasResponse {
        personas: state.engine.catalog().iter().map(PersonaDto::from).collect(),
        pricing: state.engine.pricing(),
    })
}

/// One transcript line.
#[derive(Debug, Serialize)]
pub struct TranscriptLine {
    /// `You` or `Assistant`.
    pub speaker: String,
    /// Message text.
    pub text: String,
}

/// Session snapshot returned by most endpoints.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// Session identifier.
    pub session_id: SessionId,
    /// Active persona id.
    pub persona: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Rendered transcript, system message excluded.
    pub transcript: Vec<TranscriptLine>,
    /// Usage of the most recent turn.
    pub last_usage: Option<UsageEstimate>,
}

fn view(id: SessionId, entry: &SessionEntry) -> SessionView {
    SessionView {
        session_id: id,
        persona: entry.session.persona().id.clone(),
        created_at: entry.created_at,
        transcript: entry
            .session
            .render_transcript()
            .map(|e| TranscriptLine {
                speaker: e.speaker.to_string(),
                text: e.text.to_string(),
            })
            .collect(),
        last_usage: entry.last_usage,
    }
}

/// Session creation request.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Persona id; the catalog default when omitted.
    pub persona: Option<String>,
}

/// Start a new session.
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let session = state
        .engine
        .start_session(request.persona.as_deref())
        .map_err(chat_error)?;
    let persona = session.persona().id.clone();
    let id = state.insert_session(session);
    tracing::info!(session = %id, %persona, "session created");

    let shared = lookup(&state, id)?;
    let entry = shared.lock().await;
    Ok((StatusCode::CREATED, Json(view(id, &entry))))
}

/// Current transcript of a session.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionView>, ApiError> {
    let shared = lookup(&state, id)?;
    let mut entry = shared.lock().await;
    entry.touch();
    Ok(Json(view(id, &entry)))
}

/// Persona selection request.
#[derive(Debug, Deserialize)]
pub struct SelectPersonaRequest {
    /// Persona id from the catalog.
    pub persona: String,
}

/// Switch the persona of a session (clears history when it changes).
async fn select_persona(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<SelectPersonaRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let shared = lookup(&state, id)?;
    let mut entry = shared.lock().await;
    entry.touch();
    let changed = state
        .engine
        .select_persona(&mut entry.session, &request.persona)
        .map_err(chat_error)?;
    if changed {
        entry.last_usage = None;
    }
    Ok(Json(view(id, &entry)))
}

/// User message submission.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// The user's message.
    pub message: String,
}

/// Reply to a submitted message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Reply as stored in the session.
    pub reply: String,
    /// Usage estimate for this turn.
    pub usage: UsageEstimate,
    /// Total cost formatted for display.
    pub cost_display: String,
    /// Session snapshot after the turn.
    #[serde(flatten)]
    pub session: SessionView,
}

/// Run one turn for a session.
async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    UserMessage::new(request.message.as_str()).map_err(chat_error)?;
    let shared = lookup(&state, id)?;
    let worker = Arc::clone(&state);

    let outcome = tokio::task::spawn_blocking(move || {
        let mut entry = shared.blocking_lock();
        entry.touch();
        let mut rng = rand::thread_rng();
        let report = worker
            .engine
            .run_turn(&mut entry.session, &request.message, &mut rng)?;
        entry.last_usage = Some(report.usage);
        Ok::<_, ChatError>((report, view(id, &entry)))
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("turn worker failed: {e}"),
        )
    })?;

    let (report, session) = outcome.map_err(chat_error)?;
    Ok(Json(MessageResponse {
        cost_display: report.usage.display_cost(),
        reply: report.reply,
        usage: report.usage,
        session,
    }))
}

/// Reset a session to its opening form.
async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionView>, ApiError> {
    let shared = lookup(&state, id)?;
    let mut entry = shared.lock().await;
    entry.touch();
    entry.session.reset();
    entry.last_usage = None;
    Ok(Json(view(id, &entry)))
}

/// Download the transcript as a document.
async fn export_session(
    State(state): State<Arc<AppState>>,
    Path((id, format)): Path<(SessionId, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;
    let shared = lookup(&state, id)?;
    let transcript = {
        let mut entry = shared.lock().await;
        entry.touch();
        entry.session.transcript_text()
    };

    let document = export_transcript(format, &transcript).map_err(|e| {
        tracing::warn!(session = %id, %format, error = %e, "export failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("export failed: {e}"))
    })?;

    let disposition = format!("attachment; filename=\"{}\"", document.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, document.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    ))
}

/// Drop a session.
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(&id) {
        tracing::info!(session = %id, "session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path, query, and body data via axum extractors,
//! forwards the action to the session orchestrator, and returns JSON.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hydrosense_core::config::ScalerMode;
use hydrosense_core::{
    ChatTurn, Labels, Language, Parameter, PotabilityResult, WaterSample,
};
use hydrosense_session::{SessionError, SessionListing, SessionSnapshot};

use crate::error::ApiError;
use crate::extract::SessionId;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LanguageParams {
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub model_loaded: bool,
    pub scaler_mode: ScalerMode,
    pub llm_model: String,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub key: String,
    pub label: String,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Irrigation guidance band, e.g. `"6.5 - 8.5"`; absent when none applies.
    pub optimal: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParametersResponse {
    pub language: Language,
    pub title: String,
    pub optimal_ranges_title: String,
    pub parameters: Vec<ParameterInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub id: Uuid,
    pub language: Language,
}

/// Prediction plus the localized text the presentation layer shows for it.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: PotabilityResult,
    pub label: Option<u8>,
    pub title: String,
    pub description: String,
    /// Keys of parameters outside their guidance band.
    pub out_of_optimal: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: ChatTurn,
    pub turn_count: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health - liveness and component status.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model_loaded: orchestrator.predictor().is_available(),
        scaler_mode: orchestrator.predictor().scaler_mode(),
        llm_model: orchestrator.responder().model_name().to_string(),
        active_sessions: orchestrator.session_count(),
    })
}

/// GET /parameters?lang= - form metadata for the nine inputs.
pub async fn parameters(
    State(state): State<AppState>,
    Query(params): Query<LanguageParams>,
) -> Result<Json<ParametersResponse>, ApiError> {
    let language = resolve_language(params.lang.as_deref(), &state)?;
    let labels = Labels::for_language(language);
    let parameters = Parameter::ALL
        .into_iter()
        .map(|p| {
            let (min, max) = p.input_range();
            ParameterInfo {
                key: p.key().to_string(),
                label: labels.parameter(p).to_string(),
                unit: p.unit().to_string(),
                min,
                max,
                default: p.default_value(),
                optimal: p.optimal_range().map(|r| r.to_string()),
            }
        })
        .collect();

    Ok(Json(ParametersResponse {
        language,
        title: labels.water_params.to_string(),
        optimal_ranges_title: labels.optimal_ranges.to_string(),
        parameters,
    }))
}

/// POST /sessions?lang= - start a new session.
pub async fn create_session(
    State(state): State<AppState>,
    Query(params): Query<LanguageParams>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let language = resolve_language(params.lang.as_deref(), &state)?;
    let id = state.orchestrator.create_session(Some(language))?;
    Ok((StatusCode::CREATED, Json(SessionCreated { id, language })))
}

/// GET /sessions - summaries of live sessions not busy with an action.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListing>, ApiError> {
    state.orchestrator.purge_expired()?;
    Ok(Json(state.orchestrator.list_sessions()?))
}

/// GET /sessions/{id} - full session state.
pub async fn get_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.orchestrator.snapshot(id).await?))
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.delete_session(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/{id}/analyze - store a sample and predict its potability.
///
/// A missing model is not an error: the result carries `status: "unavailable"`.
pub async fn analyze(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    body: Result<Json<WaterSample>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(sample) = body.map_err(|e| ApiError::UnprocessableEntity(e.body_text()))?;
    let analysis = state.orchestrator.analyze(id, sample).await?;
    let labels = Labels::for_language(analysis.language);
    let result = analysis.result;

    let (title, description) = match &result {
        PotabilityResult::Predicted { potability } => {
            let (title, desc) = labels.verdict(*potability);
            (title.to_string(), desc.to_string())
        }
        PotabilityResult::Unavailable { reason } => {
            (labels.unavailable_title.to_string(), reason.clone())
        }
    };

    Ok(Json(AnalyzeResponse {
        label: result.label(),
        result,
        title,
        description,
        out_of_optimal: sample
            .out_of_optimal()
            .into_iter()
            .map(|p| p.key().to_string())
            .collect(),
    }))
}

/// POST /sessions/{id}/chat - one advisory exchange.
///
/// Before any sample has been analyzed this answers 409 with the
/// "analyze first" warning in the session's language.
pub async fn chat(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    match state.orchestrator.send_message(id, &request.message).await {
        Ok(exchange) => Ok(Json(ChatResponse {
            reply: exchange.reply,
            turn_count: exchange.turn_count,
        })),
        Err(SessionError::NoSample) => {
            let language = state.orchestrator.language(id).await?;
            Err(ApiError::Conflict(
                Labels::for_language(language).analyze_first.to_string(),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// DELETE /sessions/{id}/chat - empty the transcript.
pub async fn clear_chat(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.clear_chat(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /sessions/{id}/sample - forget the sample and its result.
pub async fn reset_params(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.reset_params(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /sessions/{id}/language
pub async fn set_language(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    body: Result<Json<LanguageRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let language = Language::from_str(&request.language)?;
    state.orchestrator.set_language(id, language).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Helpers --

fn resolve_language(requested: Option<&str>, state: &AppState) -> Result<Language, ApiError> {
    match requested {
        Some(code) => Ok(Language::from_str(code)?),
        None => Ok(state.config.chat.default_language),
    }
}

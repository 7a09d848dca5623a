use crate::api::AppState;
use crate::domain::message::{Message, NewMessage};
use crate::error::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Stores a new message and returns it with its assigned id and timestamp.
///
/// # Errors
/// Returns `AppError::Database` if the message cannot be stored.
pub async fn send_message(State(state): State<AppState>, Json(new): Json<NewMessage>) -> Result<impl IntoResponse> {
    let message = state.message_service.send(new).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Fetches a single message by receiver and message id.
///
/// # Errors
/// Returns `AppError::BadRequest` if either id is not a UUID.
/// Returns `AppError::NotFound` if the message does not exist.
pub async fn get_message(
    State(state): State<AppState>,
    Path((receiver_id, message_id)): Path<(String, String)>,
) -> Result<Json<Message>> {
    let receiver_id = parse_id("receiverId", &receiver_id)?;
    let message_id = parse_id("messageId", &message_id)?;

    let message = state.message_service.get(message_id, receiver_id).await?;
    Ok(Json(message))
}

fn parse_id(name: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::BadRequest(format!("Invalid {name}: {e}")))
}

//! Media Upload Handler
//!
//! `POST /api/channels/{channel_id}/media`, multipart with a `file` part
//! and an optional `messageType` part overriding the kind inferred from the
//! file's MIME type.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::application::dto::MessageView;
use crate::application::services::MediaUpload;
use crate::domain::MessageType;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn upload_media(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    let mut file = None;
    let mut declared_type = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some((file_name, content_type, data));
            }
            Some("messageType") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                let kind = MessageType::parse(value.trim()).ok_or_else(|| {
                    AppError::Validation(format!("Unknown message type '{}'", value.trim()))
                })?;
                declared_type = Some(kind);
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;

    let view = state
        .media
        .publish(MediaUpload {
            channel_id,
            uploader_id: auth.user_id,
            file_name,
            content_type,
            declared_type,
            data,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

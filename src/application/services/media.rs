//! Media Bridge
//!
//! Turns an uploaded file into a stored reference and feeds it into the
//! ingestion pipeline exactly like a live message.

use std::sync::Arc;

use axum::body::Bytes;

use crate::application::dto::MessageView;
use crate::domain::{ChannelRepository, MessageType};
use crate::infrastructure::media::MediaStorage;
use crate::shared::error::GatewayError;

use super::membership::BANNED_REASON;
use super::pipeline::{IngestRequest, MessagePipeline, Origin};

/// One uploaded file, as received by the HTTP layer.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub channel_id: i64,
    pub uploader_id: i64,
    pub file_name: String,
    pub content_type: Option<String>,
    /// Explicit kind; otherwise inferred from `content_type`
    pub declared_type: Option<MessageType>,
    pub data: Bytes,
}

impl MediaUpload {
    fn media_type(&self) -> Result<MessageType, GatewayError> {
        let kind = self
            .declared_type
            .or_else(|| self.content_type.as_deref().and_then(MessageType::from_mime));

        match kind {
            Some(kind) if kind.is_media() => Ok(kind),
            _ => Err(GatewayError::Invalid(
                "Unsupported media type. Expected image, video or audio.".into(),
            )),
        }
    }
}

pub struct MediaBridge {
    channels: Arc<dyn ChannelRepository>,
    storage: Arc<dyn MediaStorage>,
    pipeline: Arc<MessagePipeline>,
    max_upload_size: usize,
}

impl MediaBridge {
    pub fn new(
        channels: Arc<dyn ChannelRepository>,
        storage: Arc<dyn MediaStorage>,
        pipeline: Arc<MessagePipeline>,
        max_upload_size: usize,
    ) -> Self {
        Self {
            channels,
            storage,
            pipeline,
            max_upload_size,
        }
    }

    /// Store the file, then ingest its reference as a media message.
    ///
    /// The channel and ban checks run before the file is written so that a
    /// rejected upload leaves nothing on disk; the pipeline checks again and
    /// the file is removed if that or persistence fails.
    pub async fn publish(&self, upload: MediaUpload) -> Result<MessageView, GatewayError> {
        let message_type = upload.media_type()?;

        if upload.data.is_empty() {
            return Err(GatewayError::Invalid("Empty file.".into()));
        }
        if upload.data.len() > self.max_upload_size {
            return Err(GatewayError::Invalid(format!(
                "File too large. Maximum size is {} bytes.",
                self.max_upload_size
            )));
        }

        let channel = self
            .channels
            .find_by_id(upload.channel_id)
            .await
            .map_err(GatewayError::persistence("uploading the file"))?
            .ok_or(GatewayError::ChannelNotFound(upload.channel_id))?;
        if channel.is_banned(upload.uploader_id) {
            return Err(GatewayError::Forbidden(BANNED_REASON));
        }

        let media_ref = self
            .storage
            .store(&upload.file_name, &upload.data)
            .await
            .map_err(GatewayError::persistence("uploading the file"))?;

        tracing::info!(
            channel_id = upload.channel_id,
            uploader_id = upload.uploader_id,
            media_ref = %media_ref,
            size = upload.data.len(),
            "Media stored"
        );

        let result = self
            .pipeline
            .ingest(
                Origin::Upload,
                IngestRequest {
                    channel_id: upload.channel_id,
                    sender_id: upload.uploader_id,
                    message_type,
                    text: None,
                    media_ref: Some(media_ref.clone()),
                },
            )
            .await;

        // No message refers to the file once ingest has failed.
        if result.is_err() {
            if let Err(e) = self.storage.remove(&media_ref).await {
                tracing::warn!(media_ref = %media_ref, error = %e, "Orphaned media file left on disk");
            }
        }

        result
    }
}

//! Post creation over HTTP.
//!
//! `POST {prefix}/posts` takes the multipart body built by `SubmissionEncoder` and
//! answers with a line-delimited `data: {json}` progress stream that ends with the
//! created post.

use async_trait::async_trait;
use bytes::Bytes;
use mentro_compose::{BodyReader, PostTransport, SubmissionPayload, TransportError, TransportResponse};
use reqwest::multipart::{Form, Part};
use reqwest::Body;

use crate::ApiClient;

impl ApiClient {
    pub fn posts_path(&self) -> String {
        format!("{}/posts", self.api_prefix())
    }
}

/// Convert an encoded submission into a reqwest multipart form.
/// Text fields come first, then file parts in payload order. File parts share the
/// staged `Bytes` instead of copying them.
pub fn payload_to_form(payload: SubmissionPayload) -> reqwest::Result<Form> {
    let mut form = Form::new();
    for (field, value) in payload.text_fields() {
        form = form.text(field, value.to_string());
    }

    for part in payload.parts {
        let file = part.file;
        let body = Part::stream_with_length(Body::from(file.data().clone()), file.size())
            .file_name(file.name().to_string())
            .mime_str(file.content_type())?;
        form = form.part(part.field, body);
    }

    Ok(form)
}

#[async_trait]
impl PostTransport for ApiClient {
    async fn send(&self, payload: SubmissionPayload) -> Result<TransportResponse, TransportError> {
        let attachments = payload.parts.len();
        let form = payload_to_form(payload).map_err(|e| TransportError::Send(e.to_string()))?;

        let path = self.posts_path();
        tracing::debug!(path = %path, attachments, "Sending post");

        let response = self
            .post_multipart_raw(&path, form)
            .await
            .map_err(|e| TransportError::Send(format!("{:#}", e)))?;

        let status = response.status();
        let empty = status == reqwest::StatusCode::NO_CONTENT || response.content_length() == Some(0);
        let body = if status.is_success() && empty {
            None
        } else {
            Some(Box::new(ResponseReader::new(response)) as Box<dyn BodyReader>)
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Streams a reqwest response body chunk by chunk.
pub struct ResponseReader {
    response: Option<reqwest::Response>,
}

impl ResponseReader {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            response: Some(response),
        }
    }
}

#[async_trait]
impl BodyReader for ResponseReader {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.response.as_mut() {
            Some(response) => response
                .chunk()
                .await
                .map_err(|e| TransportError::Read(e.to_string())),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        // Dropping the response closes the connection if the body was not drained.
        self.response.take();
    }
}

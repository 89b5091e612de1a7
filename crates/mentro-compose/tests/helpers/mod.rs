//! Scripted transport for driving the controller without a network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use mentro_compose::{BodyReader, PostTransport, SubmissionPayload, TransportError, TransportResponse};
use mentro_core::models::FileHandle;

/// One step of a scripted response body.
#[derive(Clone, Debug)]
pub enum Step {
    Chunk(Bytes),
    Fail(String),
    /// Never yields another chunk.
    Hang,
}

pub fn chunk(text: &str) -> Step {
    Step::Chunk(Bytes::from(text.to_string()))
}

/// Scripted outcome of one `send` call.
#[derive(Clone, Debug)]
pub enum Reply {
    Respond { status: u16, body: Option<Vec<Step>> },
    FailSend(String),
}

impl Reply {
    pub fn ok(steps: Vec<Step>) -> Self {
        Reply::Respond {
            status: 200,
            body: Some(steps),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            body: Some(vec![chunk(body)]),
        }
    }
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    pub sent: Arc<Mutex<Vec<SubmissionPayload>>>,
    pub releases: Arc<AtomicUsize>,
    pub chunks_read: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Self::default()
        }
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl PostTransport for ScriptedTransport {
    async fn send(&self, payload: SubmissionPayload) -> Result<TransportResponse, TransportError> {
        self.sent.lock().unwrap().push(payload);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left");

        match reply {
            Reply::FailSend(message) => Err(TransportError::Send(message)),
            Reply::Respond { status, body } => Ok(TransportResponse {
                status,
                body: body.map(|steps| {
                    Box::new(ScriptedReader {
                        steps: steps.into(),
                        releases: self.releases.clone(),
                        chunks_read: self.chunks_read.clone(),
                    }) as Box<dyn BodyReader>
                }),
            }),
        }
    }
}

struct ScriptedReader {
    steps: VecDeque<Step>,
    releases: Arc<AtomicUsize>,
    chunks_read: Arc<AtomicUsize>,
}

#[async_trait]
impl BodyReader for ScriptedReader {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.steps.pop_front() {
            Some(Step::Chunk(bytes)) => {
                self.chunks_read.fetch_add(1, Ordering::SeqCst);
                Ok(Some(bytes))
            }
            Some(Step::Fail(message)) => Err(TransportError::Read(message)),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn png(name: &str) -> FileHandle {
    FileHandle::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}

pub fn progress_line(file_name: &str, progress: u32) -> String {
    format!(
        "data: {{\"fileName\":\"{}\",\"progress\":{}}}\n",
        file_name, progress
    )
}

pub fn complete_line(post_id: &str) -> String {
    format!(
        "data: {{\"type\":\"complete\",\"post\":{{\"id\":\"{}\",\"author\":{{\"id\":\"u1\",\"name\":\"Ada\"}},\"content\":\"hello\",\"media\":[{{\"type\":\"image\",\"url\":\"https://cdn.example/a.png\"}}],\"likes\":0,\"comments\":0,\"timestamp\":\"2026-10-18T09:30:00Z\",\"tags\":[\"#intro\"]}}}}\n",
        post_id
    )
}

//! Draining a turn's event channel.
//!
//! Streaming clients get an [`EventStream`]: every content event in
//! emission order, heartbeats injected while the channel is idle, and the
//! stream closed right after the terminal event. Buffered clients get
//! [`drain_buffered`], which discards intermediate frames and returns the
//! terminal outcome.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::response::sse::Event;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Elapsed, StreamExt};

use crate::api::TurnResult;
use crate::engine::EngineError;
use crate::error::ApiError;

use super::events::TurnEvent;

/// SSE encoder over one turn's event channel.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = Result<TurnEvent, Elapsed>> + Send>>,
    finished: bool,
}

impl EventStream {
    /// Wrap the channel, arming a heartbeat that fires whenever no event
    /// arrives within `heartbeat_interval`.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<TurnEvent>, heartbeat_interval: Duration) -> Self {
        Self {
            inner: Box::pin(ReceiverStream::new(rx).timeout(heartbeat_interval)),
            finished: false,
        }
    }
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(event))) => {
                if event.is_terminal() {
                    self.finished = true;
                }
                Poll::Ready(Some(Ok(event.to_sse())))
            }
            // Idle past the heartbeat interval.
            Poll::Ready(Some(Err(_))) => Poll::Ready(Some(Ok(TurnEvent::heartbeat_frame()))),
            Poll::Ready(None) => {
                // Producer vanished without a terminal event; close loudly.
                self.finished = true;
                let synthesized = TurnEvent::Error {
                    kind: "engine_error",
                    message: "turn ended without a result".to_string(),
                };
                Poll::Ready(Some(Ok(synthesized.to_sse())))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Collect a buffered turn: wait for the terminal event and return the
/// embedded result. Intermediate frames are dropped here; their text is
/// already aggregated into the result by the sink.
pub async fn drain_buffered(mut rx: mpsc::Receiver<TurnEvent>) -> Result<TurnResult, ApiError> {
    while let Some(event) = rx.recv().await {
        match event {
            TurnEvent::Complete(result) => return Ok(*result),
            TurnEvent::Error { kind, message } => {
                return Err(match kind {
                    "timeout" => ApiError::Timeout(message),
                    _ => ApiError::Engine(EngineError::Failed(message)),
                });
            }
            _ => {}
        }
    }
    Err(ApiError::Engine(EngineError::Failed(
        "turn ended without a result".to_string(),
    )))
}

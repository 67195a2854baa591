//! SSE presence stream handler.
//!
//! `GET /api/presence/stream/{world_cell_id}` holds a `text/event-stream`
//! response open and writes one `data: <json>\n\n` frame per presence event
//! for that cell. The first frame is always `{"type":"connected",...}`.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::header,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Sse,
    },
};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;

use adventure_domain::{PresenceEvent, WorldCellId};
use adventure_shared::PresenceFrame;

use crate::app::App;
use crate::infrastructure::presence::{
    PresenceBus, PresenceSubscriber, SubscriberError, Subscription,
};

use super::http::ApiError;

/// Events buffered per stream before new ones are dropped for that client.
const STREAM_CHANNEL_BUFFER: usize = 256;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Handler for `GET /api/presence/stream/{world_cell_id}`.
pub async fn presence_stream(
    State(app): State<Arc<App>>,
    Path(world_cell_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let world_cell_id =
        WorldCellId::new(world_cell_id).map_err(|_| ApiError::BadRequest("invalid_world_cell_id"))?;

    app.presence.bridge.ensure_started().await.map_err(|e| {
        tracing::error!(error = %e, world_cell_id = %world_cell_id, "Presence bridge unavailable");
        ApiError::Unavailable("bridge_unavailable")
    })?;

    let stream = PresenceStream::open(&app.presence.bus, world_cell_id);
    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL));

    Ok(([(header::CONNECTION, "keep-alive")], sse))
}

/// Bus subscriber feeding one stream's bounded channel.
struct ChannelSubscriber {
    sender: mpsc::Sender<PresenceEvent>,
}

impl PresenceSubscriber for ChannelSubscriber {
    fn notify(&self, event: &PresenceEvent) -> Result<(), SubscriberError> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SubscriberError::Lagging,
            TrySendError::Closed(_) => SubscriberError::Closed,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Streaming,
    Closed,
}

/// Body of one presence stream.
///
/// Owns the bus registration: when the client goes away the response body
/// is dropped, which unsubscribes.
pub struct PresenceStream {
    state: StreamState,
    connected: Option<WorldCellId>,
    events: ReceiverStream<PresenceEvent>,
    subscription: Subscription,
}

impl PresenceStream {
    pub fn open(bus: &PresenceBus, world_cell_id: WorldCellId) -> Self {
        let (sender, receiver) = mpsc::channel(STREAM_CHANNEL_BUFFER);
        let subscription = bus.subscribe(
            world_cell_id.clone(),
            Arc::new(ChannelSubscriber { sender }),
        );

        tracing::info!(world_cell_id = %world_cell_id, "Presence stream opened");
        Self {
            state: StreamState::Streaming,
            connected: Some(world_cell_id),
            events: ReceiverStream::new(receiver),
            subscription,
        }
    }

    fn close(&mut self) {
        if self.state == StreamState::Closed {
            return;
        }
        self.state = StreamState::Closed;
        self.subscription.unsubscribe();
        tracing::info!(
            world_cell_id = %self.subscription.world_cell_id(),
            "Presence stream closed"
        );
    }
}

fn frame(frame: &PresenceFrame) -> Option<Event> {
    match frame.to_json() {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize presence frame");
            None
        }
    }
}

impl Stream for PresenceStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state == StreamState::Closed {
            return Poll::Ready(None);
        }

        if let Some(world_cell_id) = this.connected.take() {
            if let Some(event) = frame(&PresenceFrame::connected(world_cell_id)) {
                return Poll::Ready(Some(Ok(event)));
            }
        }

        loop {
            match this.events.poll_next_unpin(cx) {
                Poll::Ready(Some(event)) => {
                    if let Some(event) = frame(&PresenceFrame::from(event)) {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
                Poll::Ready(None) => {
                    this.close();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for PresenceStream {
    fn drop(&mut self) {
        self.close();
    }
}

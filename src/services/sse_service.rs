use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the shared presence feed.
pub fn subscribe_presence(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.presence_hub().subscribe()
}

/// Bridge a hub subscription into a per-client bounded channel.
///
/// The forwarder first greets the new subscriber with a handshake event no
/// other subscriber sees, then relays hub broadcasts. The small bounded
/// channel lets one slow subscriber lag (and skip) instead of stalling the
/// hub for everyone else.
pub fn presence_channel(
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> mpsc::Receiver<ServerEvent> {
    let (tx, rx) = mpsc::channel::<ServerEvent>(8);

    tokio::spawn(async move {
        if let Some(greeting) = handshake_event()
            && tx.send(greeting).await.is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(payload).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive;
                            // the listing endpoint stays authoritative.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!("presence SSE stream disconnected");
    });

    rx
}

/// Convert a hub subscription into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // axum drops the mpsc side when the client disconnects, which unwinds
    // the forwarder task behind the channel.
    let stream =
        ReceiverStream::new(presence_channel(receiver)).map(|payload| Ok(render_event(payload)));
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn render_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

fn handshake_event() -> Option<ServerEvent> {
    let payload = Handshake {
        stream: "presence".into(),
        message: "subscribed to presence events".into(),
    };
    match ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize handshake event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::state::sse::SseHub;

    #[tokio::test]
    async fn new_subscriber_is_greeted_then_receives_broadcasts() {
        let hub = SseHub::new(8);
        let mut channel = presence_channel(hub.subscribe());

        let greeting = channel.recv().await.expect("handshake delivered");
        assert_eq!(greeting.event.as_deref(), Some("handshake"));
        assert!(greeting.data.contains("presence"));

        hub.broadcast(ServerEvent {
            event: Some("player:status".into()),
            data: "{}".into(),
        });
        let relayed = channel.recv().await.expect("broadcast relayed");
        assert_eq!(relayed.event.as_deref(), Some("player:status"));
    }

    #[tokio::test]
    async fn handshake_is_private_to_the_new_subscriber() {
        let hub = SseHub::new(8);
        let mut observer = hub.subscribe();

        let mut channel = presence_channel(hub.subscribe());
        channel.recv().await.expect("handshake delivered");

        assert!(matches!(observer.try_recv(), Err(TryRecvError::Empty)));
    }
}

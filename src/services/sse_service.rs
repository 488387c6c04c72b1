use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::AppState,
};

const ACTIVITY_STREAM: &str = "activity";

/// Subscribe to the shared activity stream.
///
/// The returned handshake is emitted first so clients learn whether the
/// backend is currently degraded without waiting for the next status flip.
pub fn subscribe_activity(state: &AppState) -> (broadcast::Receiver<ServerEvent>, Option<ServerEvent>) {
    let receiver = state.activity().subscribe();
    let handshake = ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            stream: ACTIVITY_STREAM.to_string(),
            degraded: state.is_degraded(),
        },
    )
    .ok();
    (receiver, handshake)
}

/// Convert a broadcast receiver into an SSE response, forwarding events
/// until the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    first: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(payload) = first {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "activity SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!("Activity SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn handshake_reports_degraded_mode() {
        let state = AppState::new(AppConfig::default(), None);
        let (_receiver, handshake) = subscribe_activity(&state);
        let handshake = handshake.unwrap();
        assert_eq!(handshake.event.as_deref(), Some("handshake"));
        assert_eq!(handshake.data, r#"{"stream":"activity","degraded":true}"#);
    }
}

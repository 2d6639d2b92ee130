// Server-sent event streaming of view updates
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Stream every value published on `rx` as a JSON event, starting with the
/// current one. `render` turns the raw view data into what clients see.
pub fn sse_from_watch<T, R, F>(
    rx: watch::Receiver<T>,
    render: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Clone + Send + Sync + 'static,
    R: Serialize,
    F: Fn(T) -> R + Send + 'static,
{
    let stream = WatchStream::new(rx).map(move |value| Ok(json_event(&render(value))));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("keep-alive"))
}

fn json_event<R: Serialize>(payload: &R) -> Event {
    match Event::default().json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!("Could not serialize event: {}", e);
            Event::default().event("error").data("serialization failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_streams_current_and_later_values() {
        let (tx, rx) = watch::channel(1u32);
        let response = sse_from_watch(rx, |n| serde_json::json!({ "n": n })).into_response();
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/event-stream"
        );

        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&first).unwrap(), "data: {\"n\":1}\n\n");

        tx.send(2).unwrap();
        let second = body.next().await.unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&second).unwrap(), "data: {\"n\":2}\n\n");
    }
}

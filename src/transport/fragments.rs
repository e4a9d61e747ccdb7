//! Fragment streams: turn a chunked response body into text fragments.
//!
//! Two body formats are supported:
//!
//! - **Plain text**: every chunk is decoded as UTF-8 and forwarded as is.
//! - **Event stream**: `data: <json>` records, each carrying a `content`
//!   field. Malformed records are skipped; an `error` record ends the stream.

use super::utf8::Utf8Decoder;
use crate::error::{Error, Result};
use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::Deserialize;
use tracing::{trace, warn};

/// A stream of decoded text fragments.
///
/// Ends after the first error.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// One event-stream record as sent by the chat backend.
#[derive(Debug, Deserialize)]
struct StreamRecord {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// What a single event-stream record contributes.
#[derive(Debug, PartialEq, Eq)]
enum Record {
    Content(String),
    Failed(String),
    Skip,
}

fn parse_record(data: &str) -> Record {
    if data.trim().is_empty() {
        return Record::Skip;
    }

    match serde_json::from_str::<StreamRecord>(data) {
        Ok(StreamRecord { error: Some(message), .. }) => Record::Failed(message),
        Ok(StreamRecord { content: Some(text), .. }) if !text.is_empty() => Record::Content(text),
        Ok(_) => Record::Skip,
        Err(err) => {
            warn!(%err, data, "skipping malformed stream record");
            Record::Skip
        }
    }
}

/// Decode a plain-text body into fragments.
pub fn text_fragments<S, E>(body: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    let state = Some((body.boxed(), Utf8Decoder::new()));

    stream::unfold(state, |state| async move {
        let (mut body, mut decoder) = state?;
        loop {
            match body.next().await {
                Some(Ok(chunk)) => {
                    let text = decoder.decode(&chunk);
                    if !text.is_empty() {
                        trace!(bytes = chunk.len(), "text chunk");
                        return Some((Ok(text), Some((body, decoder))));
                    }
                }
                Some(Err(err)) => return Some((Err(err.into()), None)),
                None => {
                    let tail = decoder.finish();
                    return (!tail.is_empty()).then_some((Ok(tail), None));
                }
            }
        }
    })
    .boxed()
}

/// Decode an event-stream body of `data: <json>` records into fragments.
pub fn event_fragments<S, E>(body: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + std::fmt::Display + Send + 'static,
{
    let events = body.eventsource().boxed();

    stream::unfold(Some(events), |events| async move {
        let mut events = events?;
        loop {
            match events.next().await? {
                Ok(event) => match parse_record(&event.data) {
                    Record::Content(text) => return Some((Ok(text), Some(events))),
                    Record::Failed(message) => return Some((Err(Error::Server(message)), None)),
                    Record::Skip => {}
                },
                Err(EventStreamError::Transport(err)) => return Some((Err(err.into()), None)),
                Err(err) => return Some((Err(Error::Stream(err.to_string())), None)),
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        let chunks: Vec<Result<Bytes>> = chunks
            .iter()
            .copied()
            .map(|c| Ok(Bytes::from_static(c)))
            .collect();
        stream::iter(chunks)
    }

    async fn collect(mut fragments: FragmentStream) -> (Vec<String>, Option<Error>) {
        let mut out = Vec::new();
        while let Some(item) = fragments.next().await {
            match item {
                Ok(text) => out.push(text),
                Err(err) => return (out, Some(err)),
            }
        }
        (out, None)
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record(r#"{"content":"Hi"}"#), Record::Content("Hi".into()));
        assert_eq!(parse_record(r#"{"content":""}"#), Record::Skip);
        assert_eq!(parse_record(r#"{"other":1}"#), Record::Skip);
        assert_eq!(parse_record("   "), Record::Skip);
        assert_eq!(parse_record("{not json"), Record::Skip);
        assert_eq!(parse_record(r#"{"error":"boom"}"#), Record::Failed("boom".into()));
    }

    #[tokio::test]
    async fn test_text_fragments_rejoin_split_chars() {
        let fragments = text_fragments(body(&[b"Hel", b"lo \xE2", b"\x9C\x93"]));
        let (out, err) = collect(fragments).await;
        assert!(err.is_none());
        assert_eq!(out, ["Hel", "lo ", "✓"]);
    }

    #[tokio::test]
    async fn test_text_fragments_stop_on_error() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(Error::Stream("reset by peer".into())),
            Ok(Bytes::from_static(b"never seen")),
        ];
        let (out, err) = collect(text_fragments(stream::iter(chunks))).await;
        assert_eq!(out, ["partial"]);
        assert!(matches!(err, Some(Error::Stream(_))));
    }

    #[tokio::test]
    async fn test_event_fragments_reassemble_split_records() {
        let fragments = event_fragments(body(&[
            b"data: {\"content\": \"Hel",
            b"lo\"}\n\ndata: {\"content\": \" world\"}\n\n",
        ]));
        let (out, err) = collect(fragments).await;
        assert!(err.is_none());
        assert_eq!(out, ["Hello", " world"]);
    }

    #[tokio::test]
    async fn test_event_fragments_skip_malformed() {
        let fragments = event_fragments(body(&[
            b": keep-alive\n\n",
            b"data: {broken\n\n",
            b"data: {\"content\": \"\"}\n\n",
            b"data: {\"content\": \"ok\"}\n\n",
        ]));
        let (out, err) = collect(fragments).await;
        assert!(err.is_none());
        assert_eq!(out, ["ok"]);
    }

    #[tokio::test]
    async fn test_event_fragments_error_record() {
        let fragments = event_fragments(body(&[
            b"data: {\"content\": \"a\"}\n\n",
            b"data: {\"error\": \"model unavailable\"}\n\n",
            b"data: {\"content\": \"b\"}\n\n",
        ]));
        let (out, err) = collect(fragments).await;
        assert_eq!(out, ["a"]);
        assert!(matches!(err, Some(Error::Server(msg)) if msg == "model unavailable"));
    }
}

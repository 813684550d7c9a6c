//! Server-push event stream
//!
//! Wraps the Salt API `text/event-stream` endpoint as a pull-based source.
//! The connection is owned by the returned [`EventStream`] handle; closing it
//! (explicitly or by drop) releases the connection exactly once. A transport
//! error terminates the stream by emitting a sentinel [`StreamItem::End`] —
//! the consumer never observes an error.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::ConsoleError;
use crate::models::event::SaltEvent;

/// One item pulled from the stream
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// A parsed event frame
    Event(SaltEvent),

    /// End of stream: transport error or server close
    End,
}

/// Owned handle over one server-push connection
pub struct EventStream {
    rx: mpsc::Receiver<StreamItem>,
    task: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Open the stream against `{base_url}/events?token={token}`
    pub async fn connect(base_url: &str, token: &str) -> Result<Self, ConsoleError> {
        let url = format!("{}/events?token={}", base_url.trim_end_matches('/'), token);
        debug!("Opening event stream: {}", url);

        let client = reqwest::Client::builder().build()?;
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ConsoleError::StreamError(format!(
                "event stream rejected: {}",
                response.status()
            )));
        }

        let (tx, rx) = mpsc::channel(64);
        let task = tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            let mut body = response.bytes_stream();

            loop {
                match body.next().await {
                    Some(Ok(chunk)) => {
                        for payload in decoder.push(&chunk) {
                            match serde_json::from_str::<SaltEvent>(&payload) {
                                Ok(event) => {
                                    if tx.send(StreamItem::Event(event)).await.is_err() {
                                        // Consumer gone, stop reading
                                        return;
                                    }
                                }
                                Err(e) => {
                                    warn!("Skipping unparseable event frame: {}", e);
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Event stream transport error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            let _ = tx.send(StreamItem::End).await;
        });

        Ok(Self {
            rx,
            task: Some(task),
        })
    }

    /// Build a stream over an existing channel (no network connection)
    pub fn from_channel(rx: mpsc::Receiver<StreamItem>) -> Self {
        Self { rx, task: None }
    }

    /// Pull the next item, suspending until a frame or termination arrives.
    /// A closed channel reads as [`StreamItem::End`].
    pub async fn next(&mut self) -> StreamItem {
        self.rx.recv().await.unwrap_or(StreamItem::End)
    }

    /// Close the stream and release the connection
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Incremental `text/event-stream` frame decoder.
///
/// Feeds of raw bytes produce the `data` payloads of complete events.
/// Multi-line data fields are joined with newlines; comment, `event`, `id`
/// and `retry` lines are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of bytes; returns the data payloads of all events
    /// completed by this chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some(end) = find_event_boundary(&self.buffer) {
            let event: String = self.buffer.drain(..end.frame_len).collect();
            self.buffer.drain(..end.separator_len);

            let mut data_lines = Vec::new();
            for line in event.lines() {
                if let Some(value) = line.strip_prefix("data:") {
                    data_lines.push(value.strip_prefix(' ').unwrap_or(value));
                }
            }
            if !data_lines.is_empty() {
                payloads.push(data_lines.join("\n"));
            }
        }
        payloads
    }
}

struct EventBoundary {
    frame_len: usize,
    separator_len: usize,
}

fn find_event_boundary(buffer: &str) -> Option<EventBoundary> {
    let lf = buffer.find("\n\n").map(|at| EventBoundary {
        frame_len: at,
        separator_len: 2,
    });
    let crlf = buffer.find("\r\n\r\n").map(|at| EventBoundary {
        frame_len: at,
        separator_len: 4,
    });

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.frame_len <= b.frame_len { a } else { b }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"tag\":\"salt/job/1/ret\"}\n\n");
        assert_eq!(payloads, vec!["{\"tag\":\"salt/job/1/ret\"}"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"tag\":").is_empty());
        let payloads = decoder.push(b"\"a\"}\n\n");
        assert_eq!(payloads, vec!["{\"tag\":\"a\"}"]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: 1\n\ndata: 2\n\n");
        assert_eq!(payloads, vec!["1", "2"]);
    }

    #[test]
    fn test_multi_line_data_joined() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: first\ndata: second\n\n");
        assert_eq!(payloads, vec!["first\nsecond"]);
    }

    #[test]
    fn test_ignores_comments_and_metadata_fields() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keepalive\n\nid: 7\nevent: ping\nretry: 500\n\ndata: x\n\n");
        assert_eq!(payloads, vec!["x"]);
    }

    #[test]
    fn test_crlf_framing() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: y\r\n\r\n");
        assert_eq!(payloads, vec!["y"]);
    }
}

//! `text/event-stream` transport over reqwest.
//!
//! Plays the role the browser's `EventSource` plays for the original:
//! long-lived GET, incremental SSE frame parsing, automatic reconnect
//! honoring the server's `retry:` hint, `Last-Event-ID` on reconnect. All of
//! that stays behind the [`EventTransport`] trait — the hub never sees a
//! reconnect happen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{EventTransport, RawEvent, TransportFactory, TransportOptions};
use crate::error::HubError;

const DEFAULT_RETRY_MS: u64 = 3000;
const EVENT_CHANNEL_CAPACITY: usize = 1024;

type SenderMap = Arc<Mutex<HashMap<String, broadcast::Sender<RawEvent>>>>;

/// One live SSE connection with its background read loop.
pub struct HttpSseTransport {
    senders: SenderMap,
    cancel: CancellationToken,
}

impl HttpSseTransport {
    /// Open a stream and spawn its read loop.
    pub fn open(client: reqwest::Client, url: String) -> Arc<Self> {
        let senders: SenderMap = Arc::new(Mutex::new(HashMap::new()));
        let cancel = CancellationToken::new();

        let transport = Arc::new(Self {
            senders: senders.clone(),
            cancel: cancel.clone(),
        });

        tokio::spawn(read_loop(client, url, senders, cancel));
        transport
    }
}

impl EventTransport for HttpSseTransport {
    fn events(&self, event: &str) -> broadcast::Receiver<RawEvent> {
        let mut senders = self.senders.lock().expect("sender map poisoned");
        senders
            .entry(event.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn close(&self) {
        self.cancel.cancel();
        // Dropping the senders is the terminal-close signal to receivers.
        self.senders.lock().expect("sender map poisoned").clear();
    }
}

/// Factory handing out [`HttpSseTransport`]s. `with_credentials` selects a
/// client with a cookie store, matching the `EventSource` credentials flag.
pub struct HttpTransportFactory {
    anonymous: reqwest::Client,
    credentialed: reqwest::Client,
}

impl HttpTransportFactory {
    pub fn new() -> Result<Self, HubError> {
        let anonymous = reqwest::Client::builder()
            .build()
            .map_err(|e| HubError::Transport(e.to_string()))?;
        let credentialed = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| HubError::Transport(e.to_string()))?;
        Ok(Self {
            anonymous,
            credentialed,
        })
    }
}

impl TransportFactory for HttpTransportFactory {
    fn open(
        &self,
        url: &str,
        options: TransportOptions,
    ) -> Result<Arc<dyn EventTransport>, HubError> {
        let client = if options.with_credentials {
            self.credentialed.clone()
        } else {
            self.anonymous.clone()
        };
        Ok(HttpSseTransport::open(client, url.to_string()))
    }
}

async fn read_loop(client: reqwest::Client, url: String, senders: SenderMap, cancel: CancellationToken) {
    let mut parser = SseParser::default();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let mut request = client.get(&url).header("Accept", "text/event-stream");
        if let Some(id) = &parser.last_event_id {
            request = request.header("Last-Event-ID", id.clone());
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!("SSE stream open: {}", url);
                let mut body = response.bytes_stream();
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        chunk = body.next() => match chunk {
                            Some(Ok(bytes)) => {
                                for frame in parser.feed(&bytes) {
                                    dispatch(&senders, frame);
                                }
                            }
                            Some(Err(e)) => {
                                warn!("SSE stream error on {}: {}", url, e);
                                break;
                            }
                            None => {
                                debug!("SSE stream ended: {}", url);
                                break;
                            }
                        }
                    }
                }
            }
            Ok(response) => {
                warn!("SSE endpoint {} answered {}", url, response.status());
            }
            Err(e) => {
                warn!("SSE connect to {} failed: {}", url, e);
            }
        }

        let delay = Duration::from_millis(parser.retry_ms.unwrap_or(DEFAULT_RETRY_MS));
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

fn dispatch(senders: &SenderMap, frame: RawEvent) {
    let senders = senders.lock().expect("sender map poisoned");
    if let Some(tx) = senders.get(&frame.event) {
        // Send fails only when nobody is subscribed right now.
        let _ = tx.send(frame);
    }
}

/// Incremental SSE wire-format parser. Fed raw chunks, yields complete
/// frames; tracks `id:` and `retry:` fields on the side.
#[derive(Default)]
struct SseParser {
    buf: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    last_event_id: Option<String>,
    retry_ms: Option<u64>,
}

impl SseParser {
    fn feed(&mut self, bytes: &[u8]) -> Vec<RawEvent> {
        self.buf.extend_from_slice(bytes);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.handle_line(line.trim_end_matches(['\n', '\r']), &mut out);
        }

        out
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<RawEvent>) {
        if line.is_empty() {
            if !self.data.is_empty() {
                let event = self.event.take().unwrap_or_else(|| "message".to_string());
                let data = std::mem::take(&mut self.data).join("\n");
                out.push(RawEvent::new(event, data));
            }
            self.event = None;
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.last_event_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry_ms = Some(ms);
                }
            }
            _ => {}
        }
    }
}

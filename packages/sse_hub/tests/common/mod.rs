//! Shared doubles for hub integration tests: a scriptable transport, a
//! factory that records every open, and an in-memory render target.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;

use sse_hub::{
    EventTransport, HubError, Payload, RawEvent, RenderContext, RenderFn, RenderOutput,
    RenderTarget, TargetId, TransportFactory, TransportOptions,
};

pub struct MockTransport {
    pub url: String,
    senders: Mutex<HashMap<String, broadcast::Sender<RawEvent>>>,
    closes: AtomicUsize,
}

impl MockTransport {
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: url.to_string(),
            senders: Mutex::new(HashMap::new()),
            closes: AtomicUsize::new(0),
        })
    }

    /// Push one event to whoever is listening for `event`.
    pub fn emit(&self, event: &str, data: &str) {
        let senders = self.senders.lock().unwrap();
        if let Some(tx) = senders.get(event) {
            let _ = tx.send(RawEvent::new(event, data));
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl EventTransport for MockTransport {
    fn events(&self, event: &str) -> broadcast::Receiver<RawEvent> {
        self.senders
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .subscribe()
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.senders.lock().unwrap().clear();
    }
}

/// Records every transport it opens so tests can drive and inspect them.
#[derive(Default)]
pub struct MockFactory {
    opened: Mutex<Vec<Arc<MockTransport>>>,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn transport(&self, index: usize) -> Arc<MockTransport> {
        self.opened.lock().unwrap()[index].clone()
    }
}

impl TransportFactory for MockFactory {
    fn open(
        &self,
        url: &str,
        _options: TransportOptions,
    ) -> Result<Arc<dyn EventTransport>, HubError> {
        let transport = MockTransport::new(url);
        self.opened.lock().unwrap().push(transport.clone());
        Ok(transport)
    }
}

/// Factory that refuses every open.
pub struct FailingFactory;

impl TransportFactory for FailingFactory {
    fn open(
        &self,
        url: &str,
        _options: TransportOptions,
    ) -> Result<Arc<dyn EventTransport>, HubError> {
        Err(HubError::Transport(format!("refused to open {url}")))
    }
}

/// In-memory stand-in for a UI target.
pub struct MockTarget {
    id: TargetId,
    content: Mutex<String>,
    children: Mutex<Vec<String>>,
}

impl MockTarget {
    pub fn new(id: u64) -> Arc<Self> {
        Self::with_children(id, &[])
    }

    pub fn with_children(id: u64, children: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            id: TargetId(id),
            content: Mutex::new(String::new()),
            children: Mutex::new(children.iter().map(|c| c.to_string()).collect()),
        })
    }

    pub fn content(&self) -> String {
        self.content.lock().unwrap().clone()
    }

    pub fn child_list(&self) -> Vec<String> {
        self.children.lock().unwrap().clone()
    }
}

impl RenderTarget for MockTarget {
    fn id(&self) -> TargetId {
        self.id
    }

    fn set_content(&self, markup: &str) {
        *self.content.lock().unwrap() = markup.to_string();
    }

    fn append_child(&self, fragment: &str) {
        self.children.lock().unwrap().push(fragment.to_string());
    }

    fn prepend_child(&self, fragment: &str) {
        self.children.lock().unwrap().insert(0, fragment.to_string());
    }

    fn remove_first_child(&self) {
        let mut children = self.children.lock().unwrap();
        if !children.is_empty() {
            children.remove(0);
        }
    }

    fn remove_last_child(&self) {
        self.children.lock().unwrap().pop();
    }

    fn children(&self) -> Vec<String> {
        self.children.lock().unwrap().clone()
    }
}

fn join_items(
    items: &[Payload],
    _target: &dyn RenderTarget,
    _ctx: &RenderContext,
) -> anyhow::Result<Option<RenderOutput>> {
    let joined = items
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",");
    Ok(Some(RenderOutput::Markup(joined)))
}

/// Renderer that replaces the target content with all items joined by `,`.
pub fn joining_renderer() -> RenderFn {
    Arc::new(join_items)
}

fn fail(
    _items: &[Payload],
    _target: &dyn RenderTarget,
    _ctx: &RenderContext,
) -> anyhow::Result<Option<RenderOutput>> {
    Err(anyhow::anyhow!("renderer exploded"))
}

/// Renderer that errors on every delivery.
pub fn failing_renderer() -> RenderFn {
    Arc::new(fail)
}

/// Poll until `condition` holds; panics after ~2 seconds.
pub async fn wait_for(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {what}");
}

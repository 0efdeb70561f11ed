//! Scripted REST transport for integration tests.
//!
//! Collections are primed per kind with `set_list`; create/patch responses
//! are primed as FIFO queues. Every call is appended to a log so tests can
//! assert exactly which requests were issued. The list gate lets a test
//! hold list responses open to observe in-flight behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::watch;

use fleetsync::{PageMeta, RawPage, ResourceKind, SyncError, Transport};

pub struct MockTransport {
    calls: Mutex<Vec<String>>,
    lists: Mutex<HashMap<ResourceKind, Vec<Value>>>,
    entities: Mutex<HashMap<(ResourceKind, String), Value>>,
    creates: Mutex<VecDeque<Value>>,
    patches: Mutex<VecDeque<Value>>,
    fail_next: Mutex<Option<SyncError>>,
    gate_tx: watch::Sender<bool>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        let (gate_tx, _) = watch::channel(true);
        Self {
            calls: Mutex::new(Vec::new()),
            lists: Mutex::new(HashMap::new()),
            entities: Mutex::new(HashMap::new()),
            creates: Mutex::new(VecDeque::new()),
            patches: Mutex::new(VecDeque::new()),
            fail_next: Mutex::new(None),
            gate_tx,
        }
    }

    /// Replace the collection served for a kind.
    pub fn set_list(&self, kind: ResourceKind, data: Vec<Value>) {
        self.lists.lock().unwrap().insert(kind, data);
    }

    /// Serve an entity for `GET /admin/{kind}/{id}`.
    pub fn set_entity(&self, kind: ResourceKind, id: &str, value: Value) {
        self.entities
            .lock()
            .unwrap()
            .insert((kind, id.to_string()), value);
    }

    /// Queue the response for the next create call.
    pub fn push_create(&self, value: Value) {
        self.creates.lock().unwrap().push_back(value);
    }

    /// Queue the response for the next patch call.
    pub fn push_patch(&self, value: Value) {
        self.patches.lock().unwrap().push_back(value);
    }

    /// Fail the next request with the given error.
    pub fn fail_next(&self, err: SyncError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Hold list responses until `open_gate`.
    pub fn close_gate(&self) {
        self.gate_tx.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate_tx.send_replace(true);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls whose log line starts with the given prefix.
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn log(&self, line: String) {
        self.calls.lock().unwrap().push(line);
    }

    fn take_failure(&self) -> Option<SyncError> {
        self.fail_next.lock().unwrap().take()
    }

    async fn wait_gate(&self) {
        let mut rx = self.gate_tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn list(&self, kind: ResourceKind, page: u32, limit: u32) -> Result<RawPage, SyncError> {
        self.log(format!("GET /admin/{}?page={}&limit={}", kind, page, limit));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.wait_gate().await;

        let data = self
            .lists
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        let total = data.len() as u64;
        Ok(RawPage {
            data,
            meta: PageMeta {
                total,
                page,
                limit,
                total_pages: 1,
            },
        })
    }

    async fn get(&self, kind: ResourceKind, id: &str) -> Result<Value, SyncError> {
        self.log(format!("GET /admin/{}/{}", kind, id));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.entities
            .lock()
            .unwrap()
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| SyncError::from_status(404, format!("{} {} not found", kind, id)))
    }

    async fn create(&self, kind: ResourceKind, body: Value) -> Result<Value, SyncError> {
        self.log(format!("POST /admin/{} {}", kind, body));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SyncError::Transport {
                status: Some(500),
                message: "no create response primed".into(),
            })
    }

    async fn patch(&self, kind: ResourceKind, id: &str, body: Value) -> Result<Value, SyncError> {
        self.log(format!("PATCH /admin/{}/{} {}", kind, id, body));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.patches
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SyncError::Transport {
                status: Some(500),
                message: "no patch response primed".into(),
            })
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<(), SyncError> {
        self.log(format!("DELETE /admin/{}/{}", kind, id));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(())
    }

    async fn action(
        &self,
        kind: ResourceKind,
        id: &str,
        action: &str,
        body: Value,
    ) -> Result<Value, SyncError> {
        self.log(format!("POST /admin/{}/{}/{} {}", kind, id, action, body));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(json!({"message": "ok"}))
    }
}

// ---- entity payload builders ----

pub fn client_value(id: &str, name: &str, online: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "location": null,
        "isOnline": online,
        "lastSeen": null,
        "userId": "u1",
        "layoutId": null,
        "sequenceId": null,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    })
}

pub fn video_value(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "url": format!("https://example.com/{}.mp4", id),
        "title": title,
        "duration": 30,
        "thumbnail": null,
        "source": "FILE",
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    })
}

pub fn sequence_value(id: &str, name: &str, video_ids: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "videoIds": video_ids,
        "isActive": true,
        "startDate": null,
        "endDate": null,
        "activeHours": null,
        "createdAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z"
    })
}

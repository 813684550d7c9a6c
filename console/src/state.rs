//! Node view state
//!
//! In-memory counterpart of the dashboard's node store: the current node
//! list, a per-job append-only event log, and the create-node error slot.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::models::event::SaltEvent;
use crate::models::node::NodeSummary;

#[derive(Default)]
struct Inner {
    list: Vec<NodeSummary>,
    events: HashMap<String, Vec<SaltEvent>>,
    create_node_error: Option<String>,
}

/// Shared node state
#[derive(Default)]
pub struct NodesState {
    inner: RwLock<Inner>,
}

impl NodesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the node list
    pub async fn set_list(&self, list: Vec<NodeSummary>) {
        self.inner.write().await.list = list;
    }

    /// Current node list
    pub async fn list(&self) -> Vec<NodeSummary> {
        self.inner.read().await.list.clone()
    }

    /// Names of the currently known nodes
    pub async fn node_names(&self) -> Vec<String> {
        self.inner
            .read()
            .await
            .list
            .iter()
            .map(|node| node.name.clone())
            .collect()
    }

    /// Store the create-node failure message. The slot does not self-clear
    /// on the next attempt; only [`clear_create_error`] resets it.
    ///
    /// [`clear_create_error`]: NodesState::clear_create_error
    pub async fn set_create_error(&self, message: String) {
        self.inner.write().await.create_node_error = Some(message);
    }

    /// Reset the create-node error slot
    pub async fn clear_create_error(&self) {
        self.inner.write().await.create_node_error = None;
    }

    /// Current create-node error, if any
    pub async fn create_error(&self) -> Option<String> {
        self.inner.read().await.create_node_error.clone()
    }

    /// Append an event to the job's log, in arrival order. The log is never
    /// truncated.
    pub async fn push_event(&self, jid: &str, event: SaltEvent) {
        self.inner
            .write()
            .await
            .events
            .entry(jid.to_string())
            .or_default()
            .push(event);
    }

    /// Event log for a job
    pub async fn events_for(&self, jid: &str) -> Vec<SaltEvent> {
        self.inner
            .read()
            .await
            .events
            .get(jid)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tag: &str) -> SaltEvent {
        SaltEvent {
            tag: tag.to_string(),
            data: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_events_append_in_arrival_order() {
        let state = NodesState::new();
        state.push_event("1", event("salt/job/1/new")).await;
        state.push_event("1", event("salt/job/1/ret")).await;

        let log = state.events_for("1").await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].tag, "salt/job/1/new");
        assert_eq!(log[1].tag, "salt/job/1/ret");
        assert!(state.events_for("2").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_error_slot_cleared_only_explicitly() {
        let state = NodesState::new();
        state.set_create_error("node already exists".to_string()).await;
        assert_eq!(
            state.create_error().await.as_deref(),
            Some("node already exists")
        );

        state.clear_create_error().await;
        assert_eq!(state.create_error().await, None);

        // Clearing an already-empty slot is a no-op
        state.clear_create_error().await;
        assert_eq!(state.create_error().await, None);
    }
}

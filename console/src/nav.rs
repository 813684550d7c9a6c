//! Route history
//!
//! Headless counterpart of the dashboard's navigation side effects: success
//! paths push view routes, and the history is observable.

use std::sync::Mutex;

use tracing::debug;

/// Records route pushes
#[derive(Debug, Default)]
pub struct Router {
    history: Mutex<Vec<String>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push a route
    pub fn push(&self, route: impl Into<String>) {
        let route = route.into();
        debug!("Navigating to {}", route);
        self.lock().push(route);
    }

    /// Most recent route, if any
    pub fn current(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    /// Full push history
    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_history() {
        let router = Router::new();
        assert_eq!(router.current(), None);

        router.push("/nodes");
        router.push("/nodes/deploy/20230101");

        assert_eq!(router.current().as_deref(), Some("/nodes/deploy/20230101"));
        assert_eq!(router.history(), vec!["/nodes", "/nodes/deploy/20230101"]);
    }
}

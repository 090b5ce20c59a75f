//! In-memory notifier.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::NotifierPort;

/// Records every message. Intended for tests.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl InMemoryNotifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Whether any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(needle))
    }

    /// Drop recorded messages.
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

#[async_trait]
impl NotifierPort for InMemoryNotifier {
    async fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

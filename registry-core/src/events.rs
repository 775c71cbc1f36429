use registry_journal::MessageType;
use uuid::Uuid;

/// A notification fanned out to anything watching the node's apply stream
/// (health endpoints, read-your-writes probes, tests). Never fed back into
/// the write path; purely observational (§4.J).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    /// This node has observed its own Bootstrap record and is now caught up
    /// with the journal as of the moment it started consuming (§4.H, §9).
    Ready,
    /// A mutation was applied to local storage, successfully or not.
    Applied {
        uuid: Uuid,
        message_type: MessageType,
        succeeded: bool,
    },
}

/// Broadcasts `StorageEvent`s to any number of subscribers. A fixed-capacity
/// channel is fine here: late subscribers only miss events, they never block
/// the Consumer Loop (§4.J "the health surface must never slow down apply").
#[derive(Clone)]
pub struct EventBus {
    sender: tokio::sync::broadcast::Sender<StorageEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    /// Ignores the "no receivers" case; nobody watching is not an error.
    pub fn publish(&self, event: StorageEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

//! In-memory transcript store — useful for testing and one-shot runs.

use async_trait::async_trait;
use tokio::sync::RwLock;

use toolweave_core::error::StoreError;
use toolweave_core::session::TranscriptStore;
use toolweave_core::turn::Turn;

/// An in-memory transcript that keeps turns in a Vec.
///
/// Safe for a single-writer loop plus any number of concurrent readers;
/// callers share the store itself behind an `Arc`.
pub struct InMemoryTranscript {
    turns: RwLock<Vec<Turn>>,
}

impl InMemoryTranscript {
    pub fn new() -> Self {
        Self {
            turns: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscript {
    async fn append(&self, turn: Turn) -> Result<(), StoreError> {
        self.turns.write().await.push(turn);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Turn>, StoreError> {
        Ok(self.turns.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolweave_core::turn::Role;

    #[tokio::test]
    async fn append_and_replay_in_order() {
        let store = InMemoryTranscript::new();
        store.append(Turn::system("be helpful")).await.unwrap();
        store.append(Turn::user("hello")).await.unwrap();

        let turns = store.all().await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].role, Role::User);
    }

    #[tokio::test]
    async fn empty_store_replays_nothing() {
        let store = InMemoryTranscript::new();
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shared_handle_sees_all_appends() {
        let store: std::sync::Arc<dyn TranscriptStore> =
            std::sync::Arc::new(InMemoryTranscript::new());
        let writer = std::sync::Arc::clone(&store);

        writer.append(Turn::user("from writer")).await.unwrap();
        store.append(Turn::user("from reader")).await.unwrap();

        let turns = store.all().await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "from writer");
        assert_eq!(turns[1].content, "from reader");
    }
}

//! Session collaborator traits: transcript storage and usage accounting.
//!
//! The orchestration loop is the sole writer to its transcript store for
//! the duration of one run; the store only has to support append and a
//! full ordered read. The usage sink is fire-and-forget: a failing sink
//! is logged and never aborts a round.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::transport::Usage;
use crate::turn::Turn;

/// Append-only ordered log of turns.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Append one turn. Turns are immutable once appended.
    async fn append(&self, turn: Turn) -> std::result::Result<(), StoreError>;

    /// Full replay, oldest turn first.
    async fn all(&self) -> std::result::Result<Vec<Turn>, StoreError>;
}

/// Receiver for per-round token-accounting records.
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Record one round's usage. Best-effort.
    async fn record(&self, usage: Usage) -> std::result::Result<(), StoreError>;
}

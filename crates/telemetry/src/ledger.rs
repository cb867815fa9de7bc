//! In-memory usage ledger — records per-round token usage and running totals.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use toolweave_core::error::StoreError;
use toolweave_core::session::UsageSink;
use toolweave_core::transport::Usage;

/// Aggregated usage across all recorded rounds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageTotals {
    pub rounds: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// A usage sink that keeps every record and running totals in memory.
pub struct UsageLedger {
    records: Arc<RwLock<Vec<Usage>>>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every recorded round, in order.
    pub async fn records(&self) -> Vec<Usage> {
        self.records.read().await.clone()
    }

    /// Running totals across all recorded rounds.
    pub async fn totals(&self) -> UsageTotals {
        let records = self.records.read().await;
        records.iter().fold(UsageTotals::default(), |mut acc, u| {
            acc.rounds += 1;
            acc.prompt_tokens += u64::from(u.prompt_tokens);
            acc.completion_tokens += u64::from(u.completion_tokens);
            acc.total_tokens += u64::from(u.total_tokens);
            acc
        })
    }
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsageSink for UsageLedger {
    async fn record(&self, usage: Usage) -> Result<(), StoreError> {
        self.records.write().await.push(usage);
        Ok(())
    }
}

/// A sink that drops every record (accounting disabled).
pub struct NoopUsageSink;

#[async_trait]
impl UsageSink for NoopUsageSink {
    async fn record(&self, _usage: Usage) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u32, completion: u32) -> Usage {
        Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    #[tokio::test]
    async fn ledger_accumulates_totals() {
        let ledger = UsageLedger::new();
        ledger.record(usage(100, 20)).await.unwrap();
        ledger.record(usage(250, 30)).await.unwrap();

        let totals = ledger.totals().await;
        assert_eq!(totals.rounds, 2);
        assert_eq!(totals.prompt_tokens, 350);
        assert_eq!(totals.completion_tokens, 50);
        assert_eq!(totals.total_tokens, 400);
    }

    #[tokio::test]
    async fn ledger_keeps_records_in_order() {
        let ledger = UsageLedger::new();
        ledger.record(usage(1, 1)).await.unwrap();
        ledger.record(usage(2, 2)).await.unwrap();

        let records = ledger.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prompt_tokens, 1);
        assert_eq!(records[1].prompt_tokens, 2);
    }

    #[tokio::test]
    async fn noop_sink_accepts_everything() {
        let sink = NoopUsageSink;
        assert!(sink.record(usage(10, 10)).await.is_ok());
    }
}

//! Usage accounting for toolweave.
//!
//! The loop hands each round's token usage to a [`UsageSink`]
//! fire-and-forget; these implementations either keep the records with
//! running totals (the ledger) or drop them (the no-op sink).
//!
//! [`UsageSink`]: toolweave_core::session::UsageSink

pub mod ledger;

pub use ledger::{NoopUsageSink, UsageLedger, UsageTotals};

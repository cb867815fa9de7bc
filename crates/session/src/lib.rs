//! Transcript store implementations for toolweave.
//!
//! The loop only needs append plus a full ordered read, so stores stay
//! small: an in-memory Vec for tests and one-shot runs, and a JSONL file
//! for transcripts that should outlive the process.

pub mod in_memory;
pub mod jsonl;

pub use in_memory::InMemoryTranscript;
pub use jsonl::JsonlTranscript;

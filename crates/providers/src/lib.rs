//! Completion transports for toolweave.
//!
//! Currently ships one transport, [`OpenAiCompatTransport`], which
//! covers any endpoint speaking the OpenAI chat completions protocol
//! (OpenAI, OpenRouter, Ollama, vLLM, and friends).

pub mod openai_compat;

pub use openai_compat::OpenAiCompatTransport;

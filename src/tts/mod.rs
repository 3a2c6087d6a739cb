//! TTS inference proxy
//!
//! Forwards synthesis and voice-cloning requests to the external inference
//! API, retrying transient failures, and hands back the raw audio.

pub mod client;
pub mod retry;

pub use client::{AudioPayload, CloneRequest, SynthesisRequest, TtsClient};
pub use retry::{with_retry, RetryPolicy, Retryable};

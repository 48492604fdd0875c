//! Google Gemini API client.
//!
//! Implements the `GenerateClient` trait for Gemini models via the
//! Generative Language API's SSE streaming endpoint.

mod api;
mod client;
mod config;

pub use client::GeminiClient;
pub use config::{GeminiConfig, HistoryStyle};

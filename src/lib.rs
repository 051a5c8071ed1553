//! # travel-chat - streaming client for a travel-planning assistant
//!
//! A small client library (plus the `travel-chat` binary) for a chat-style
//! travel-planning backend. The backend answers over Server-Sent Events;
//! this crate turns that stream into a live-updating, sanitized and
//! syntax-highlighted HTML rendering of the assistant's Markdown reply.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Incremental UTF-8 decoding and SSE record splitting over any byte stream
//! - Full re-render of the accumulated Markdown on every chunk
//! - Sanitized output (ammonia) with class-based highlighting (syntect)
//! - Typed request payloads for chat, travel planning and attraction guides
//! - Conversation history client
//!
//! ## Architecture
//!
//! - **`sse`**: bytes → `data:` records, with a stateful UTF-8 decoder
//! - **`session`**: one `StreamSession` per request, an explicit state machine
//! - **`renderer`**: `StreamingMessageRenderer::consume` drives a session
//!   from a byte stream into a `RenderTarget`
//! - **`render`**: markdown → highlighted code blocks → sanitized HTML
//! - **`controller`** / **`planner`**: the call sites (chat, plan, guide,
//!   PDF export) built on one renderer
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use travel_chat::backend::HttpBackend;
//! use travel_chat::controller::{ChatController, Submission};
//! use travel_chat::model::AgentType;
//! use travel_chat::options::ClientConfig;
//! use travel_chat::transcript::Transcript;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let backend = Arc::new(HttpBackend::new(config.transport.clone())?);
//!     let mut controller = ChatController::new(backend, config.render.clone());
//!     let mut transcript = Transcript::new();
//!
//!     let submission = Submission::chat("Plan a weekend in Hangzhou", AgentType::General);
//!     let outcome = controller.submit(&mut transcript, submission, |_| {}).await?;
//!     println!("{}", outcome.text);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod controller;
pub mod decode;
pub mod form;
pub mod guide;
pub mod history;
pub mod http;
pub mod join;
pub mod model;
pub mod options;
pub mod planner;
pub mod render;
pub mod renderer;
pub mod session;
pub mod sse;
pub mod transcript;

// Re-exports for convenience
pub use client::{ChatBackend, ClientError};
pub use model::{ChunkEvent, StreamRequest};
pub use renderer::{RenderTarget, StreamingMessageRenderer};
pub use session::{SessionOutcome, SessionState, StreamSession, Termination};

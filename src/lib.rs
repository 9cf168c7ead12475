//! Parlance — conversation session engine for chatbot consoles.
//!
//! Turns user input into an ordered exchange with one of two backend
//! answering modes: prompt-driven generation (streamed) or retrieval over an
//! uploaded knowledge source (single-shot). The engine owns the transcript,
//! derives the rolling context each mode needs, and degrades transport
//! failures to inline assistant messages.
//!
//! # Quick Start
//!
//! ```no_run
//! use parlance::prelude::*;
//! use parlance::provider::http::HttpBackend;
//!
//! # async fn example() -> parlance::error::Result<()> {
//! let config = SessionConfig::builder()
//!     .welcome_message("Hi! Ask me anything.".to_string())
//!     .mode(SessionMode::prompt("Answer concisely"))
//!     .build();
//! let backend = HttpBackend::new(EndpointConfig::from_env());
//! let engine = SessionEngine::new(config, backend);
//!
//! engine.set_input("what is rust?");
//! engine.submit_input().await?;
//! for message in engine.transcript().messages() {
//!     println!("{}: {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod types;
pub mod upload;
pub mod util;

pub mod client;
pub mod config;
pub mod session;
pub mod sse;
pub mod types;

pub use client::*;
pub use config::*;
pub use session::*;
pub use sse::SseDecoder;
pub use types::*;

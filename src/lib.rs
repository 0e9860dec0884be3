//! # Mishap
//!
//! Resolves an HTTP status code to a rendered error page in a negotiated
//! format (HTML, JSON, XML or plain text), and either serves the result over
//! HTTP or exports the whole set as a static site.

#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
#![forbid(unsafe_code)]

// Core modules
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod http;
pub mod registry;
pub mod render;
pub mod rotation;
pub mod store;

// Re-exports for convenience
pub use crate::cache::{CacheKey, ResponseCache};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::format::Format;
pub use crate::registry::{CodeDescription, CodeDescriptor, CodeRegistry};
pub use crate::render::{RenderContext, Renderer};
pub use crate::rotation::{RotationController, RotationMode};
pub use crate::store::TemplateStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

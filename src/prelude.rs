//! # Prelude for the gemini-vertex crate
//!
//! This module re-exports the most commonly used types for convenience.
//!
//! ```rust,ignore
//! use gemini_vertex::prelude::*;
//! ```

pub use crate::auth::Credentials;
pub use crate::client::{Error as ClientError, GenerationStream, Model, Vertex};
pub use crate::config::VertexConfig;
pub use crate::generation::{
    ContentBuilder, FinishReason, GenerationConfig, GenerationResponse, UsageMetadata,
};
pub use crate::generative_model::GenerativeModel;
pub use crate::models::{Content, Part, Role};
pub use crate::report::{ResponseReport, TokenCountReport};
pub use crate::safety::{
    HarmBlockMethod, HarmBlockThreshold, HarmCategory, SafetyRating, SafetySettings,
};

//! # gemini-vertex
//!
//! A Rust client for Gemini multimodal models hosted on Google Cloud Vertex AI.
//!
//! A [`Vertex`] session is scoped to one project and region. Model handles obtained
//! from it build requests out of text and media references, and send them for a
//! complete answer, a stream of partial answers, or a token count.
//!
//! ```rust,ignore
//! use gemini_vertex::prelude::*;
//!
//! let vertex = Vertex::from_env()?;
//! let model = vertex.model(Model::Gemini15Pro);
//! let response = model
//!     .generate_content()
//!     .with_file_data("gs://cloud-samples-data/generative-ai/audio/pixel.mp3", "audio/mpeg")
//!     .with_text("Please provide a summary for the audio.")
//!     .execute()
//!     .await?;
//! println!("{}", response.text());
//! ```

pub mod auth;
mod client;
pub mod config;
pub mod generation;
mod generative_model;
pub mod media;
mod models;
pub mod prelude;
pub mod report;
pub mod safety;


pub use auth::{Credentials, ServiceAccountKey};
pub use client::{Error as ClientError, GenerationStream, HttpTransport, Model, Transport, Vertex};
pub use config::VertexConfig;
pub use generation::{
    BlockReason, Candidate, ContentBuilder, CountTokensRequest, CountTokensResponse,
    FinishReason, GenerateContentRequest, GenerationConfig, GenerationResponse,
    ModalityTokenCount, PromptFeedback, UsageMetadata,
};
pub use generative_model::GenerativeModel;
pub use models::{Blob, Content, FileData, Part, Role};
pub use report::{ResponseReport, TokenCountReport};
pub use safety::{
    HarmBlockMethod, HarmBlockThreshold, HarmCategory, HarmProbability, HarmSeverity,
    SafetyRating, SafetySetting, SafetySettings,
};

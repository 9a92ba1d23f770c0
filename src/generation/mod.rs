pub mod builder;
pub mod model;

pub use builder::ContentBuilder;
pub use model::{
    BlockReason, Candidate, CountTokensRequest, CountTokensResponse, FinishReason,
    GenerateContentRequest, GenerationConfig, GenerationResponse, ModalityTokenCount,
    PromptFeedback, UsageMetadata,
};

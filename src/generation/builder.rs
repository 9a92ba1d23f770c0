use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{Error as ClientError, GenerationStream, Transport},
    generation::model::{
        CountTokensRequest, CountTokensResponse, GenerateContentRequest, GenerationConfig,
        GenerationResponse,
    },
    models::{Content, Part, Role},
    safety::{HarmBlockThreshold, HarmCategory, SafetySettings},
};

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    transport: Arc<dyn Transport>,
    model: String,
    pub contents: Vec<Content>,
    generation_config: Option<GenerationConfig>,
    safety_settings: SafetySettings,
    system_instruction: Option<Content>,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder`.
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        model: String,
        system_instruction: Option<Content>,
    ) -> Self {
        Self {
            transport,
            model,
            contents: Vec::new(),
            generation_config: None,
            safety_settings: SafetySettings::default(),
            system_instruction,
        }
    }

    /// Appends a part to the current user turn, opening one if the last turn was the model's.
    pub fn with_part(mut self, part: impl Into<Part>) -> Self {
        let part = part.into();
        let open_turn = self
            .contents
            .last_mut()
            .filter(|content| content.role == Some(Role::User));
        if let Some(content) = open_turn {
            content.parts.push(part);
        } else {
            self.contents.push(Content::from_parts([part]).with_role(Role::User));
        }
        self
    }

    /// Appends several parts to the current user turn, keeping their order.
    pub fn with_parts<P>(mut self, parts: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<Part>,
    {
        for part in parts {
            self = self.with_part(part);
        }
        self
    }

    /// Appends text to the current user turn.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_part(Part::text(text))
    }

    /// Appends a reference to remote media (e.g. a `gs://` URI) to the current user turn.
    ///
    /// The MIME type is trusted; see [`Part::from_uri_checked`] for a local check.
    pub fn with_file_data(self, uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.with_part(Part::from_uri(uri, mime_type))
    }

    /// Appends base64-encoded inline data to the current user turn.
    pub fn with_inline_data(self, data: impl AsRef<[u8]>, mime_type: impl Into<String>) -> Self {
        self.with_part(Part::inline_bytes(data, mime_type))
    }

    /// Starts a new user turn with the given text.
    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Content::text(text).with_role(Role::User));
        self
    }

    /// Adds a model turn to the conversation history.
    pub fn with_model_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Content::text(text).with_role(Role::Model));
        self
    }

    /// Appends an instruction after those carried by the model handle.
    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction
            .get_or_insert_with(Content::default)
            .parts
            .push(Part::text(text));
        self
    }

    /// Replaces the safety settings for the request.
    pub fn with_safety_settings(mut self, safety_settings: SafetySettings) -> Self {
        self.safety_settings = safety_settings;
        self
    }

    /// Sets the blocking threshold for one harm category.
    pub fn with_safety_setting(
        mut self,
        category: HarmCategory,
        threshold: HarmBlockThreshold,
    ) -> Self {
        self.safety_settings = self.safety_settings.with(category, threshold);
        self
    }

    /// Sets the generation configuration for the request.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Sets the temperature for the request.
    ///
    /// Temperature controls the randomness of the output. Higher values (e.g., 1.0) produce
    /// more creative results, while lower values (e.g., 0.2) produce more deterministic results.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .temperature = Some(temperature);
        self
    }

    /// Sets the top-p value for the request.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .top_p = Some(top_p);
        self
    }

    /// Sets the top-k value for the request.
    pub fn with_top_k(mut self, top_k: i32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .top_k = Some(top_k);
        self
    }

    /// Sets the maximum number of output tokens for the request.
    pub fn with_max_output_tokens(mut self, max_output_tokens: i32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Sets the number of candidate responses to generate.
    pub fn with_candidate_count(mut self, candidate_count: i32) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .candidate_count = Some(candidate_count);
        self
    }

    /// Sets the stop sequences for the request.
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.generation_config
            .get_or_insert_with(Default::default)
            .stop_sequences = Some(stop_sequences);
        self
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        let safety_settings = if self.safety_settings.is_empty() {
            None
        } else {
            Some(self.safety_settings.to_settings())
        };
        GenerateContentRequest {
            contents: self.contents,
            generation_config: self.generation_config,
            safety_settings,
            system_instruction: self.system_instruction,
        }
    }

    /// Executes the request and waits for the complete answer.
    #[instrument(skip_all, fields(
        model = %self.model,
        contents.count = self.contents.len(),
        safety.settings.count = self.safety_settings.len(),
        system.instruction.present = self.system_instruction.is_some(),
    ))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let transport = self.transport.clone();
        let model = self.model.clone();
        let request = self.build();
        transport.generate_content(&model, request).await
    }

    /// Executes the request, yielding partial responses as they arrive.
    ///
    /// Dropping the stream stops consumption; chunks already received stay valid.
    #[instrument(skip_all, fields(
        model = %self.model,
        contents.count = self.contents.len(),
        safety.settings.count = self.safety_settings.len(),
        system.instruction.present = self.system_instruction.is_some(),
    ))]
    pub async fn execute_stream(self) -> Result<GenerationStream, ClientError> {
        let transport = self.transport.clone();
        let model = self.model.clone();
        let request = self.build();
        transport.stream_generate_content(&model, request).await
    }

    /// Counts the tokens the request would consume, without generating anything.
    #[instrument(skip_all, fields(
        model = %self.model,
        contents.count = self.contents.len(),
    ))]
    pub async fn count_tokens(self) -> Result<CountTokensResponse, ClientError> {
        let transport = self.transport.clone();
        let model = self.model.clone();
        let request = CountTokensRequest::from(self.build());
        transport.count_tokens(&model, request).await
    }
}

use async_trait::async_trait;
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use std::{fmt, pin::Pin, sync::Arc};
use tracing::{debug, warn};
use url::Url;

use crate::{
    auth::{self, Credentials, TokenProvider},
    config::{self, VertexConfig},
    generation::model::{
        CountTokensRequest, CountTokensResponse, GenerateContentRequest, GenerationResponse,
    },
    generative_model::GenerativeModel,
};

/// Stream of partial responses, consumed once in arrival order.
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<GenerationResponse, Error>> + Send>>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to build HTTP client"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("invalid session configuration"))]
    Config { source: config::Error },

    #[snafu(display("failed to obtain access token"))]
    Auth { source: auth::Error },

    #[snafu(display("failed to construct URL for '{suffix}'"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}{}; description: {}",
        status.as_deref().map(|s| format!(" ({s})")).unwrap_or_default(),
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// Canonical error status reported by the service, e.g. `PERMISSION_DENIED`
        status: Option<String>,
        description: Option<String>,
    },

    #[snafu(display("failed to obtain stream SSE part"))]
    BadPart {
        source: EventStreamError<reqwest::Error>,
    },

    #[snafu(display("failed to deserialize JSON response"))]
    Deserialize { source: serde_json::Error },

    #[snafu(display("failed to read response body"))]
    DecodeResponse { source: reqwest::Error },
}

impl Error {
    /// HTTP status of a service-side failure.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::BadResponse { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the service rejected the request for exceeding a quota or rate limit.
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }
}

/// Known publisher models
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Model {
    Gemini15ProPreview0514,
    #[default]
    Gemini15Pro,
    Gemini15Flash,
    Gemini20Flash,
    /// Any other model id, or a full `projects/...` resource name
    Custom(String),
}

impl Model {
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini15ProPreview0514 => "gemini-1.5-pro-preview-0514",
            Model::Gemini15Pro => "gemini-1.5-pro",
            Model::Gemini15Flash => "gemini-1.5-flash",
            Model::Gemini20Flash => "gemini-2.0-flash",
            Model::Custom(model) => model,
        }
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Model::Custom(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Model::Custom(model.to_string())
    }
}

impl AsRef<str> for Model {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote model endpoint.
///
/// `model` is always a fully qualified resource name
/// (`projects/{p}/locations/{l}/publishers/google/models/{m}`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error>;

    async fn stream_generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerationStream, Error>;

    async fn count_tokens(
        &self,
        model: &str,
        request: CountTokensRequest,
    ) -> Result<CountTokensResponse, Error>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// [`Transport`] speaking JSON over HTTPS to the Vertex AI REST API.
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: Url,
    tokens: TokenProvider,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &VertexConfig, credentials: Credentials) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder()
            .build()
            .context(BuildHttpClientSnafu)?;
        Self::with_client(http_client, config, credentials)
    }

    /// Uses a preconfigured reqwest client, e.g. one with proxies or custom timeouts.
    pub fn with_client(
        http_client: reqwest::Client,
        config: &VertexConfig,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let base_url = config.base_url().context(ConfigSnafu)?;
        Ok(Self {
            http_client,
            base_url,
            tokens: TokenProvider::new(credentials),
        })
    }

    fn build_url(&self, model: &str, method: &str) -> Result<Url, Error> {
        let suffix = format!("{model}:{method}");
        self.base_url
            .join(&suffix)
            .context(ConstructUrlSnafu { suffix })
    }

    async fn send<T: Serialize + Sync>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<reqwest::Response, Error> {
        let token = self
            .tokens
            .token(&self.http_client)
            .await
            .context(AuthSnafu)?;

        debug!(%url, "sending request");
        let response = self
            .http_client
            .post(url.clone())
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;
        Self::check_response(response).await
    }

    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => Some(body),
            Err(error) => {
                warn!(%error, "failed to read error response body");
                None
            }
        };
        Err(bad_response(status.as_u16(), body))
    }

    async fn post_json<Req, Resp>(
        &self,
        model: &str,
        method: &str,
        body: &Req,
    ) -> Result<Resp, Error>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.build_url(model, method)?;
        let response = self.send(url, body).await?;
        let bytes = response.bytes().await.context(DecodeResponseSnafu)?;
        serde_json::from_slice(&bytes).context(DeserializeSnafu)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        self.post_json(model, "generateContent", &request).await
    }

    async fn stream_generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerationStream, Error> {
        let mut url = self.build_url(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        let response = self.send(url, &request).await?;
        Ok(Box::pin(sse_chunks(response.bytes_stream().eventsource())))
    }

    async fn count_tokens(
        &self,
        model: &str,
        request: CountTokensRequest,
    ) -> Result<CountTokensResponse, Error> {
        self.post_json(model, "countTokens", &request).await
    }
}

/// Maps a rejected request to [`Error::BadResponse`], using the service's error
/// envelope when the body carries one and the raw body otherwise.
fn bad_response(code: u16, body: Option<String>) -> Error {
    let envelope = body
        .as_deref()
        .and_then(|body| serde_json::from_str::<ErrorEnvelope>(body).ok());
    let (status, description) = match envelope {
        Some(ErrorEnvelope { error }) => (error.status, error.message.or(body)),
        None => (None, body),
    };
    warn!(code, status = status.as_deref(), "request rejected by server");
    Error::BadResponse {
        code,
        status,
        description,
    }
}

/// Decodes each server-sent event into a response chunk.
fn sse_chunks<S>(events: S) -> impl Stream<Item = Result<GenerationResponse, Error>> + Send
where
    S: Stream<Item = Result<Event, EventStreamError<reqwest::Error>>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut events = Box::pin(events);
        while let Some(event) = events.next().await {
            let event = event.context(BadPartSnafu)?;
            if event.data.trim().is_empty() {
                continue;
            }
            let chunk: GenerationResponse =
                serde_json::from_str(&event.data).context(DeserializeSnafu)?;
            yield chunk;
        }
    }
}

/// An authenticated Vertex AI session scoped to one project and region.
#[derive(Clone)]
pub struct Vertex {
    config: Arc<VertexConfig>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Vertex {
    /// Create a session that talks to Vertex AI over HTTPS.
    pub fn new(config: VertexConfig, credentials: Credentials) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config, credentials)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a session from `PROJECT_ID`, `REGION` and the credential variables.
    pub fn from_env() -> Result<Self, Error> {
        let config = VertexConfig::from_env().context(ConfigSnafu)?;
        let credentials = Credentials::from_env().context(AuthSnafu)?;
        Self::new(config, credentials)
    }

    /// Create a session over an arbitrary transport.
    pub fn with_transport(config: VertexConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &VertexConfig {
        &self.config
    }

    /// Handle to a model without system instructions.
    pub fn model(&self, model: impl Into<Model>) -> GenerativeModel {
        self.model_with_system_instruction(model, Vec::<String>::new())
    }

    /// Handle to a model that sends `instructions`, in order, with every request.
    pub fn model_with_system_instruction<I, S>(
        &self,
        model: impl Into<Model>,
        instructions: I,
    ) -> GenerativeModel
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = model.into();
        let resource = self.config.model_resource(model.as_str());
        GenerativeModel::new(
            self.transport.clone(),
            model,
            resource,
            instructions.into_iter().map(Into::into).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::model::FinishReason;
    use futures::TryStreamExt;
    use serde_json::json;

    fn transport() -> HttpTransport {
        HttpTransport::new(
            &VertexConfig::new("my-project", "us-central1"),
            Credentials::AccessToken("token".into()),
        )
        .unwrap()
    }

    #[test]
    fn builds_method_urls() {
        let transport = transport();
        let model =
            VertexConfig::new("my-project", "us-central1").model_resource("gemini-1.5-pro");
        let url = transport.build_url(&model, "generateContent").unwrap();
        assert_eq!(
            url.as_str(),
            concat!(
                "https://us-central1-aiplatform.googleapis.com/v1/projects/my-project",
                "/locations/us-central1/publishers/google/models/gemini-1.5-pro:generateContent"
            )
        );
    }

    #[test]
    fn model_names() {
        assert_eq!(
            Model::Gemini15ProPreview0514.as_str(),
            "gemini-1.5-pro-preview-0514"
        );
        assert_eq!(Model::from("gemini-exp").as_str(), "gemini-exp");
    }

    #[test]
    fn bad_response_display_includes_status() {
        let err = Error::BadResponse {
            code: 403,
            status: Some("PERMISSION_DENIED".into()),
            description: Some("denied".into()),
        };
        assert_eq!(
            err.to_string(),
            "bad response from server; code 403 (PERMISSION_DENIED); description: denied"
        );
        assert!(!err.is_rate_limited());
    }

    fn sse_body(body: String) -> impl Stream<Item = Result<GenerationResponse, Error>> + Send {
        let bytes = futures::stream::iter([Ok::<_, reqwest::Error>(body.into_bytes())]);
        sse_chunks(bytes.eventsource())
    }

    fn text_chunk(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
    }

    #[tokio::test]
    async fn sse_events_become_chunks_in_arrival_order() {
        let mut last = text_chunk("lo");
        last["candidates"][0]["finishReason"] = json!("STOP");
        let body = format!("data: {}\n\ndata:   \n\ndata: {last}\n\n", text_chunk("Hel"));

        let chunks: Vec<GenerationResponse> = sse_body(body).try_collect().await.unwrap();

        let texts: Vec<String> = chunks.iter().map(GenerationResponse::text).collect();
        assert_eq!(texts, ["Hel", "lo"]);
        assert_eq!(
            chunks.last().and_then(GenerationResponse::finish_reason),
            Some(FinishReason::Stop)
        );
    }

    #[tokio::test]
    async fn malformed_sse_chunk_is_a_deserialize_error() {
        let body = "data: {\"candidates\":[]}\n\ndata: {not json\n\n".to_string();

        let results: Vec<_> = sse_body(body).collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::Deserialize { .. })));
    }

    #[test]
    fn error_envelope_maps_to_bad_response() {
        let body = json!({
            "error": {
                "code": 429,
                "message": "Quota exceeded for aiplatform.googleapis.com",
                "status": "RESOURCE_EXHAUSTED"
            }
        });

        let err = bad_response(429, Some(body.to_string()));

        let Error::BadResponse {
            code,
            status,
            description,
        } = &err
        else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(*code, 429);
        assert_eq!(status.as_deref(), Some("RESOURCE_EXHAUSTED"));
        assert_eq!(
            description.as_deref(),
            Some("Quota exceeded for aiplatform.googleapis.com")
        );
        assert!(err.is_rate_limited());
    }

    #[test]
    fn non_json_error_body_is_kept_verbatim() {
        let err = bad_response(502, Some("<html>Bad Gateway</html>".to_string()));
        assert!(matches!(
            &err,
            Error::BadResponse { code: 502, status: None, description: Some(d) }
                if d == "<html>Bad Gateway</html>"
        ));

        let err = bad_response(500, None);
        assert_eq!(
            err.to_string(),
            "bad response from server; code 500; description: none"
        );
    }
}

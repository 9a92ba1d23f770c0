//! # Session configuration
//!
//! A [`VertexConfig`] scopes a session to one Google Cloud project and region. It is a
//! plain value handed to [`Vertex::new`](crate::Vertex::new), so several sessions with
//! different scopes can live side by side.

use snafu::{OptionExt, ResultExt, Snafu};
use url::Url;

/// Environment variable holding the Google Cloud project identifier.
pub const PROJECT_ID_VAR: &str = "PROJECT_ID";
/// Environment variable holding the Vertex AI region, e.g. `us-central1`.
pub const REGION_VAR: &str = "REGION";
/// Optional environment variable overriding the service base URL.
pub const ENDPOINT_VAR: &str = "VERTEX_ENDPOINT";

const GLOBAL_LOCATION: &str = "global";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("required environment variable '{name}' is not set"))]
    MissingVariable { name: &'static str },

    #[snafu(display("failed to parse endpoint '{endpoint}'"))]
    InvalidEndpoint {
        source: url::ParseError,
        endpoint: String,
    },
}

/// Project and region scope for a Vertex AI session.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexConfig {
    project_id: String,
    location: String,
    endpoint: Option<Url>,
}

impl VertexConfig {
    /// Creates a configuration for the given project and region.
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            endpoint: None,
        }
    }

    /// Reads `PROJECT_ID` and `REGION` (plus the optional `VERTEX_ENDPOINT`) from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Fails if either required variable is absent or blank.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), but resolves variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .context(MissingVariableSnafu { name })
        };

        let project_id = required(PROJECT_ID_VAR)?;
        let location = required(REGION_VAR)?;
        let config = Self::new(project_id, location);

        match lookup(ENDPOINT_VAR).filter(|value| !value.trim().is_empty()) {
            Some(endpoint) => config.with_endpoint(endpoint.trim()),
            None => Ok(config),
        }
    }

    /// Overrides the service base URL, e.g. for a private endpoint or a local proxy.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, Error> {
        // `Url::join` drops the last path segment unless the base ends with a slash
        let normalized = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let url = Url::parse(&normalized).context(InvalidEndpointSnafu { endpoint })?;
        self.endpoint = Some(url);
        Ok(self)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Base URL all model resources are resolved against.
    pub fn base_url(&self) -> Result<Url, Error> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        let endpoint = if self.location == GLOBAL_LOCATION {
            "https://aiplatform.googleapis.com/v1/".to_string()
        } else {
            format!("https://{}-aiplatform.googleapis.com/v1/", self.location)
        };
        Url::parse(&endpoint).context(InvalidEndpointSnafu { endpoint })
    }

    /// Fully qualified resource name of a Google-published model in this scope.
    ///
    /// Identifiers that already start with `projects/` are returned unchanged.
    pub fn model_resource(&self, model: &str) -> String {
        if model.starts_with("projects/") {
            return model.to_string();
        }
        let model = model
            .strip_prefix("publishers/google/models/")
            .or_else(|| model.strip_prefix("models/"))
            .unwrap_or(model);
        format!(
            "projects/{}/locations/{}/publishers/google/models/{}",
            self.project_id, self.location, model
        )
    }
}

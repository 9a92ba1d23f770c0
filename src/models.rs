//! # Core Vertex AI Data Primitives
//!
//! This module defines the building blocks shared by every request and response:
//! [`Content`] turns made of ordered [`Part`]s, each either text or a reference to
//! media the model should look at.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::media;

/// Role of a turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn authored by the user
    User,
    /// Turn authored by the model
    Model,
}

/// One unit of a request or response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Literal text
    Text {
        /// The text content
        text: String,
        /// Whether this part is a thought summary rather than answer text
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Bytes sent inline with the request
    InlineData {
        /// The blob data
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    /// Media stored elsewhere, referenced by URI (e.g. `gs://bucket/clip.mp4`)
    FileData {
        /// Location and declared type of the media
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: None,
        }
    }

    /// References remote media with a caller-declared MIME type.
    ///
    /// The MIME type is trusted as-is; a wrong type is only noticed by the service.
    pub fn from_uri(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Part::FileData {
            file_data: FileData::new(uri, mime_type),
        }
    }

    /// References remote media, rejecting a declared MIME type that contradicts the
    /// URI's file extension.
    ///
    /// URIs without a recognizable extension are accepted with the declared type.
    pub fn from_uri_checked(
        uri: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, media::Error> {
        let uri = uri.into();
        let mime_type = mime_type.into();
        media::check_declared_type(&uri, &mime_type)?;
        Ok(Self::from_uri(uri, mime_type))
    }

    /// References remote media, inferring the MIME type from the URI's extension.
    pub fn from_uri_guessed(uri: impl Into<String>) -> Result<Self, media::Error> {
        let uri = uri.into();
        let mime_type = media::guess_type(&uri)?;
        Ok(Self::from_uri(uri, mime_type.essence_str()))
    }

    /// Sends raw bytes inline, base64-encoding them.
    pub fn inline_bytes(data: impl AsRef<[u8]>, mime_type: impl Into<String>) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        Part::InlineData {
            inline_data: Blob::new(mime_type, encoded),
        }
    }

    /// Returns the text of a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Whether this part is a thought summary.
    pub fn is_thought(&self) -> bool {
        matches!(self, Part::Text { thought: Some(true), .. })
    }
}

impl From<&str> for Part {
    fn from(text: &str) -> Self {
        Part::text(text)
    }
}

impl From<String> for Part {
    fn from(text: String) -> Self {
        Part::text(text)
    }
}

impl From<FileData> for Part {
    fn from(file_data: FileData) -> Self {
        Part::FileData { file_data }
    }
}

/// Blob for a message part
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// The MIME type of the data
    pub mime_type: String,
    /// Base64 encoded data
    pub data: String,
}

impl Blob {
    /// Create a new blob with mime type and data
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Reference to media held in an object store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// The declared MIME type of the referenced object
    pub mime_type: String,
    /// Location of the object, e.g. `gs://bucket/path/file.pdf`
    pub file_uri: String,
}

impl FileData {
    pub fn new(file_uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            file_uri: file_uri.into(),
        }
    }
}

/// A turn in a conversation: an ordered list of parts plus the author role.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Parts of the content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
    /// Role of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Content {
    /// Create a new text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_parts([Part::text(text)])
    }

    /// Create content from parts, keeping their order.
    pub fn from_parts<P>(parts: impl IntoIterator<Item = P>) -> Self
    where
        P: Into<Part>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            role: None,
        }
    }

    /// Add a role to this content
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Concatenated text of all non-thought text parts.
    pub fn text_parts(&self) -> String {
        self.parts
            .iter()
            .filter(|part| !part.is_thought())
            .filter_map(Part::as_text)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_data_part_serializes_to_camel_case() {
        let part = Part::from_uri("gs://bucket/pixel.mp3", "audio/mpeg");
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"fileData": {"mimeType": "audio/mpeg", "fileUri": "gs://bucket/pixel.mp3"}})
        );
    }

    #[test]
    fn text_part_omits_unset_thought_flag() {
        let part = Part::text("hello");
        assert_eq!(serde_json::to_value(&part).unwrap(), json!({"text": "hello"}));
    }

    #[test]
    fn inline_bytes_are_base64_encoded() {
        let part = Part::inline_bytes(b"\x89PNG", "image/png");
        match part {
            Part::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/png");
                assert_eq!(inline_data.data, "iVBORw==");
            }
            other => panic!("expected inline data, got {other:?}"),
        }
    }

    #[test]
    fn response_parts_deserialize_by_shape() {
        let content: Content = serde_json::from_value(json!({
            "role": "model",
            "parts": [
                {"text": "thinking...", "thought": true},
                {"text": "Bonjour"},
                {"fileData": {"mimeType": "image/png", "fileUri": "gs://b/i.png"}}
            ]
        }))
        .unwrap();

        assert_eq!(content.role, Some(Role::Model));
        assert_eq!(content.parts.len(), 3);
        assert!(content.parts[0].is_thought());
        assert_eq!(content.text_parts(), "Bonjour");
    }

    #[test]
    fn content_without_parts_deserializes() {
        let content: Content = serde_json::from_value(json!({"role": "model"})).unwrap();
        assert!(content.parts.is_empty());
    }
}

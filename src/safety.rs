//! # Safety settings and ratings
//!
//! Requests carry a [`SafetySettings`] map telling the service how aggressively to
//! block each [`HarmCategory`]. Responses report what the service found as
//! [`SafetyRating`]s. A block is reported through these ratings and the finish
//! reason, never as a request error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Category of harmful content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    /// Category is unspecified.
    #[serde(rename = "HARM_CATEGORY_UNSPECIFIED")]
    Unspecified,
    /// Harassment content.
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    /// Hate speech and content.
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    /// Sexually explicit content.
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    /// Dangerous content.
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    /// Content that may be used to harm civic integrity.
    #[serde(rename = "HARM_CATEGORY_CIVIC_INTEGRITY")]
    CivicIntegrity,
    /// Any category this crate does not know about yet.
    #[serde(other)]
    Other,
}

impl HarmCategory {
    /// The four categories every request can configure.
    pub const CONFIGURABLE: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HarmCategory::Unspecified => "HARM_CATEGORY_UNSPECIFIED",
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
            HarmCategory::CivicIntegrity => "HARM_CATEGORY_CIVIC_INTEGRITY",
            HarmCategory::Other => "OTHER",
        }
    }

    /// Whether a request may carry a setting for this category.
    pub fn is_settable(&self) -> bool {
        !matches!(self, HarmCategory::Unspecified | HarmCategory::Other)
    }
}

impl fmt::Display for HarmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum severity at which content in a category is blocked
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    /// Threshold is unspecified; the service default applies.
    #[serde(rename = "HARM_BLOCK_THRESHOLD_UNSPECIFIED")]
    Unspecified,
    /// Block low, medium and high probability content.
    BlockLowAndAbove,
    /// Block medium and high probability content.
    BlockMediumAndAbove,
    /// Block only high probability content.
    BlockOnlyHigh,
    /// Block nothing.
    BlockNone,
    /// Turn the safety filter off entirely.
    Off,
}

/// Whether a threshold is compared against probability or severity scores
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockMethod {
    Severity,
    Probability,
}

/// Safety setting for a single category, as sent on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SafetySetting {
    /// The category of content to filter
    pub category: HarmCategory,
    /// The threshold for filtering
    pub threshold: HarmBlockThreshold,
    /// The score the threshold applies to; the service picks when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HarmBlockMethod>,
}

impl SafetySetting {
    pub fn new(category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        Self {
            category,
            threshold,
            method: None,
        }
    }
}

/// Mapping from harm category to blocking threshold.
///
/// Each category appears at most once; setting it again replaces the earlier threshold.
/// [`HarmCategory::Unspecified`] and [`HarmCategory::Other`] are rejected by the service
/// and are never recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafetySettings {
    settings: BTreeMap<HarmCategory, SafetySetting>,
}

impl SafetySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one threshold to all configurable categories.
    pub fn uniform(threshold: HarmBlockThreshold) -> Self {
        HarmCategory::CONFIGURABLE
            .into_iter()
            .map(|category| (category, threshold))
            .collect()
    }

    /// Sets the threshold for one category, letting the service pick the method.
    pub fn with(self, category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        self.with_setting(SafetySetting::new(category, threshold))
    }

    /// Sets the threshold for one category and the score it is compared against.
    pub fn with_method(
        self,
        category: HarmCategory,
        threshold: HarmBlockThreshold,
        method: HarmBlockMethod,
    ) -> Self {
        self.with_setting(SafetySetting {
            method: Some(method),
            ..SafetySetting::new(category, threshold)
        })
    }

    /// Records a complete setting, replacing any earlier one for its category.
    pub fn with_setting(mut self, setting: SafetySetting) -> Self {
        if !setting.category.is_settable() {
            warn!(category = %setting.category, "ignoring safety setting for unsettable category");
            return self;
        }
        self.settings.insert(setting.category, setting);
        self
    }

    pub fn threshold(&self, category: HarmCategory) -> Option<HarmBlockThreshold> {
        self.settings.get(&category).map(|setting| setting.threshold)
    }

    pub fn method(&self, category: HarmCategory) -> Option<HarmBlockMethod> {
        self.settings.get(&category).and_then(|setting| setting.method)
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Wire representation, one setting per category.
    pub fn to_settings(&self) -> Vec<SafetySetting> {
        self.settings.values().cloned().collect()
    }
}

impl FromIterator<(HarmCategory, HarmBlockThreshold)> for SafetySettings {
    fn from_iter<T: IntoIterator<Item = (HarmCategory, HarmBlockThreshold)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::default(), |settings, (category, threshold)| {
                settings.with(category, threshold)
            })
    }
}

/// Probability that content is harmful
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmProbability {
    #[serde(rename = "HARM_PROBABILITY_UNSPECIFIED")]
    Unspecified,
    Negligible,
    Low,
    Medium,
    High,
    #[serde(other)]
    Other,
}

/// Severity of harmful content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HarmSeverity {
    #[serde(rename = "HARM_SEVERITY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "HARM_SEVERITY_NEGLIGIBLE")]
    Negligible,
    #[serde(rename = "HARM_SEVERITY_LOW")]
    Low,
    #[serde(rename = "HARM_SEVERITY_MEDIUM")]
    Medium,
    #[serde(rename = "HARM_SEVERITY_HIGH")]
    High,
    #[serde(other)]
    Other,
}

/// Safety rating of a candidate or prompt for one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    /// The category of the rating
    pub category: HarmCategory,
    /// The probability that the content is harmful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<HarmProbability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<HarmSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_score: Option<f32>,
    /// Whether this category caused the content to be blocked
    #[serde(default)]
    pub blocked: bool,
}

impl fmt::Display for SafetyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category)?;
        if let Some(probability) = self.probability {
            write!(f, " probability={probability:?}")?;
        }
        if let Some(score) = self.probability_score {
            write!(f, " ({score:.3})")?;
        }
        if let Some(severity) = self.severity {
            write!(f, " severity={severity:?}")?;
        }
        if let Some(score) = self.severity_score {
            write!(f, " ({score:.3})")?;
        }
        if self.blocked {
            f.write_str(" [blocked]")?;
        }
        Ok(())
    }
}

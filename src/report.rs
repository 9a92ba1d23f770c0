//! Human-readable rendering of responses for console output.

use std::fmt;

use crate::generation::{CountTokensResponse, GenerationResponse};

/// Renders a response as answer text, usage, finish reason and safety ratings.
///
/// ```rust,ignore
/// println!("{}", ResponseReport::new(&response));
/// ```
pub struct ResponseReport<'a> {
    response: &'a GenerationResponse,
}

impl<'a> ResponseReport<'a> {
    pub fn new(response: &'a GenerationResponse) -> Self {
        Self { response }
    }
}

impl fmt::Display for ResponseReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.response;
        writeln!(f, "Answer:\n{}", response.text())?;

        writeln!(f, "\nUsage metadata:")?;
        match &response.usage_metadata {
            Some(usage) => writeln!(f, "{usage}")?,
            None => writeln!(f, "none")?,
        }

        let Some(candidate) = response.candidates.first() else {
            writeln!(f, "\nFinish reason:\nno candidates returned")?;
            if let Some(feedback) = &response.prompt_feedback {
                if let Some(reason) = feedback.block_reason {
                    write!(f, "prompt blocked: {reason:?}")?;
                    if let Some(message) = &feedback.block_reason_message {
                        write!(f, " ({message})")?;
                    }
                    writeln!(f)?;
                }
                for rating in &feedback.safety_ratings {
                    writeln!(f, "- {rating}")?;
                }
            }
            return Ok(());
        };

        writeln!(f, "\nFinish reason:")?;
        match candidate.finish_reason {
            Some(reason) => writeln!(f, "{reason}")?,
            None => writeln!(f, "unspecified")?,
        }
        if let Some(message) = &candidate.finish_message {
            writeln!(f, "{message}")?;
        }

        writeln!(f, "\nSafety ratings:")?;
        if candidate.safety_ratings.is_empty() {
            writeln!(f, "none")?;
        }
        for rating in &candidate.safety_ratings {
            writeln!(f, "- {rating}")?;
        }
        Ok(())
    }
}

/// Renders a token count result.
pub struct TokenCountReport<'a> {
    count: &'a CountTokensResponse,
}

impl<'a> TokenCountReport<'a> {
    pub fn new(count: &'a CountTokensResponse) -> Self {
        Self { count }
    }
}

impl fmt::Display for TokenCountReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "total_tokens: {}", self.count.total_tokens)?;
        if let Some(chars) = self.count.total_billable_characters {
            write!(f, "\ntotal_billable_characters: {chars}")?;
        }
        Ok(())
    }
}

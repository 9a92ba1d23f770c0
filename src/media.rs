//! MIME type helpers for media references.
//!
//! The service decides whether a referenced object really has the declared type.
//! These helpers offer an optional local check against the URI's file extension.

use mime::Mime;
use snafu::{OptionExt, ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("invalid MIME type '{mime_type}'"))]
    InvalidMimeType {
        source: mime::FromStrError,
        mime_type: String,
    },

    #[snafu(display("cannot infer a MIME type for '{uri}'"))]
    UnknownExtension { uri: String },

    #[snafu(display("'{uri}' looks like {expected}, but was declared as {declared}"))]
    MimeMismatch {
        uri: String,
        declared: String,
        expected: String,
    },
}

/// Path portion of a URI with any query string or fragment removed.
fn object_path(uri: &str) -> &str {
    let end = uri.find(|c: char| c == '?' || c == '#').unwrap_or(uri.len());
    &uri[..end]
}

/// Infers the MIME type of a media URI from its extension.
pub fn guess_type(uri: &str) -> Result<Mime, Error> {
    mime_guess::from_path(object_path(uri))
        .first()
        .context(UnknownExtensionSnafu { uri })
}

/// Verifies that `declared` is a well-formed MIME type consistent with the URI extension.
///
/// A URI without a known extension passes; there is nothing to contradict.
pub fn check_declared_type(uri: &str, declared: &str) -> Result<(), Error> {
    let declared_mime: Mime = declared.parse().context(InvalidMimeTypeSnafu {
        mime_type: declared,
    })?;

    let candidates = mime_guess::from_path(object_path(uri));
    if candidates.is_empty() {
        return Ok(());
    }

    let matches = candidates
        .iter()
        .any(|candidate| candidate.essence_str() == declared_mime.essence_str());
    if matches {
        return Ok(());
    }

    let expected = candidates
        .iter()
        .map(|candidate| candidate.essence_str().to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    MimeMismatchSnafu {
        uri,
        declared,
        expected,
    }
    .fail()
}

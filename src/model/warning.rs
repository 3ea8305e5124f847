//! Recoverable decoding anomalies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A non-fatal problem found while decoding part of a message.
///
/// Warnings never abort a parse. They are attached to the [`Part`](super::message::Part)
/// (or header field) they came from and leave the rest of the tree untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeWarning {
    /// An entry of an address list could not be parsed and was skipped.
    MalformedAddress { header: String, entry: String },
    /// A charset label was not recognized; bytes were decoded best-effort.
    UnknownCharset { charset: String },
    /// Characters outside the base64 alphabet were skipped.
    InvalidBase64 { skipped: usize },
    /// A base64 block ended with a dangling character that carries no full byte.
    TruncatedBase64,
    /// Quoted-printable escapes that were not valid hex were kept literally.
    InvalidQuotedPrintable { count: usize },
    /// A `multipart/*` subtype outside the RFC 2046 family; treated as `mixed`.
    UnknownMultipartSubtype { subtype: String },
    /// A `multipart/*` part without a `boundary` parameter; kept as a text leaf.
    MissingBoundary,
    /// The closing `--boundary--` line was never found.
    UnterminatedMultipart { boundary: String },
    /// The `Content-Type` value could not be parsed; RFC 2045 defaults apply.
    MalformedContentType { value: String },
    /// A `Content-Transfer-Encoding` that is not recognized; body passed through.
    UnknownTransferEncoding { encoding: String },
}

impl DecodeWarning {
    /// Log this warning through `tracing`.
    pub(crate) fn log(&self) {
        tracing::warn!(warning = %self, "Recoverable decoding problem");
    }
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedAddress { header, entry } => {
                write!(f, "skipped malformed address {entry:?} in {header}")
            }
            Self::UnknownCharset { charset } => write!(f, "unknown charset {charset:?}"),
            Self::InvalidBase64 { skipped } => {
                write!(f, "skipped {skipped} invalid base64 character(s)")
            }
            Self::TruncatedBase64 => write!(f, "base64 block ends with an incomplete quantum"),
            Self::InvalidQuotedPrintable { count } => {
                write!(f, "{count} invalid quoted-printable escape(s) kept literally")
            }
            Self::UnknownMultipartSubtype { subtype } => {
                write!(f, "unknown multipart subtype {subtype:?}, treated as mixed")
            }
            Self::MissingBoundary => write!(f, "multipart part has no boundary parameter"),
            Self::UnterminatedMultipart { boundary } => {
                write!(f, "closing delimiter for boundary {boundary:?} not found")
            }
            Self::MalformedContentType { value } => {
                write!(f, "malformed content type {value:?}, using the default type")
            }
            Self::UnknownTransferEncoding { encoding } => {
                write!(f, "unknown transfer encoding {encoding:?}, passed through")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let w = DecodeWarning::UnknownCharset {
            charset: "x-klingon".to_string(),
        };
        assert_eq!(w.to_string(), "unknown charset \"x-klingon\"");
    }

    #[test]
    fn test_serialized_shape() {
        let w = DecodeWarning::InvalidBase64 { skipped: 3 };
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"kind":"invalid_base64","skipped":3}"#);
    }
}

//! `Content-Type` and `Content-Disposition` descriptors (RFC 2045, RFC 2183).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A parsed media type with its decoded parameters.
///
/// Type, subtype and parameter names are lowercased; parameter values are
/// fully decoded (quoted strings, RFC 2231 continuations and charsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
    pub primary: String,
    pub sub: String,
    pub params: BTreeMap<String, String>,
}

impl ContentTypeDescriptor {
    pub fn new(primary: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            primary: primary.into().to_ascii_lowercase(),
            sub: sub.into().to_ascii_lowercase(),
            params: BTreeMap::new(),
        }
    }

    /// The RFC 2045 default: `text/plain; charset=<charset>`.
    pub fn default_text(charset: &str) -> Self {
        let mut ct = Self::new("text", "plain");
        ct.params.insert("charset".to_string(), charset.to_string());
        ct
    }

    /// `"type/subtype"`.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.primary, self.sub)
    }

    pub fn is(&self, primary: &str, sub: &str) -> bool {
        self.primary.eq_ignore_ascii_case(primary) && self.sub.eq_ignore_ascii_case(sub)
    }

    pub fn is_text(&self) -> bool {
        self.primary == "text"
    }

    pub fn is_multipart(&self) -> bool {
        self.primary == "multipart"
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary").filter(|b| !b.is_empty())
    }

    pub fn charset(&self) -> Option<&str> {
        self.param("charset").filter(|c| !c.is_empty())
    }
}

impl std::fmt::Display for ContentTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.primary, self.sub)
    }
}

/// A parsed `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDisposition {
    /// Lowercased disposition type, usually `inline` or `attachment`.
    pub kind: String,
    pub params: BTreeMap<String, String>,
}

impl ContentDisposition {
    pub fn is_attachment(&self) -> bool {
        self.kind == "attachment"
    }

    pub fn is_inline(&self) -> bool {
        self.kind == "inline"
    }

    pub fn filename(&self) -> Option<&str> {
        self.params
            .get("filename")
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }
}

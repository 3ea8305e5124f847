//! Header fields with lazily decoded typed values.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};

use super::address::AddressEntry;
use super::content_type::{ContentDisposition, ContentTypeDescriptor};
use super::warning::DecodeWarning;
use crate::parser::{address, header, params};

/// Semantic class of a header, chosen from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderClass {
    Address,
    Date,
    ContentType,
    ContentDisposition,
    Text,
}

impl HeaderClass {
    pub fn for_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "from" | "to" | "cc" | "bcc" | "reply-to" | "sender" | "resent-from"
            | "resent-to" | "resent-cc" | "resent-bcc" | "resent-sender" => Self::Address,
            "date" | "resent-date" => Self::Date,
            "content-type" => Self::ContentType,
            "content-disposition" => Self::ContentDisposition,
            _ => Self::Text,
        }
    }
}

/// The typed value of a header field.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Addresses(Vec<AddressEntry>),
    /// `None` when the date could not be parsed.
    Date(Option<DateTime<Utc>>),
    /// `None` when the value was malformed (RFC 2045 defaults apply).
    ContentType(Option<ContentTypeDescriptor>),
    Disposition(ContentDisposition),
    Text(String),
}

#[derive(Debug, Clone)]
struct Decoded {
    value: HeaderValue,
    warnings: Vec<DecodeWarning>,
}

/// One header line: original name, unfolded raw value, and a typed value
/// decoded on first access.
///
/// Decoding is deterministic, so the lazily filled cell never changes what
/// a caller observes.
#[derive(Debug, Clone)]
pub struct HeaderField {
    name: String,
    raw_value: String,
    decoded: OnceLock<Decoded>,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_value: raw_value.into(),
            decoded: OnceLock::new(),
        }
    }

    /// Name with its original casing.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unfolded value, undecoded.
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// Case-insensitive name match.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn class(&self) -> HeaderClass {
        HeaderClass::for_name(&self.name)
    }

    pub fn value(&self) -> &HeaderValue {
        &self.decoded().value
    }

    /// Warnings produced while decoding this field.
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.decoded().warnings
    }

    pub fn addresses(&self) -> Option<&[AddressEntry]> {
        match self.value() {
            HeaderValue::Addresses(list) => Some(list),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        match self.value() {
            HeaderValue::Date(date) => *date,
            _ => None,
        }
    }

    pub fn content_type(&self) -> Option<&ContentTypeDescriptor> {
        match self.value() {
            HeaderValue::ContentType(ct) => ct.as_ref(),
            _ => None,
        }
    }

    pub fn disposition(&self) -> Option<&ContentDisposition> {
        match self.value() {
            HeaderValue::Disposition(d) => Some(d),
            _ => None,
        }
    }

    /// Decoded unstructured text. For non-text classes this is the raw
    /// value with encoded words resolved.
    pub fn text(&self) -> String {
        match self.value() {
            HeaderValue::Text(text) => text.clone(),
            _ => header::decode_encoded_words(&self.raw_value),
        }
    }

    fn decoded(&self) -> &Decoded {
        self.decoded.get_or_init(|| {
            let mut warnings = Vec::new();
            let value = match self.class() {
                HeaderClass::Address => HeaderValue::Addresses(address::parse_address_list_with(
                    &self.name,
                    &self.raw_value,
                    &mut warnings,
                )),
                HeaderClass::Date => HeaderValue::Date(header::parse_date(&self.raw_value)),
                HeaderClass::ContentType => HeaderValue::ContentType(
                    params::parse_content_type_with(&self.raw_value, &mut warnings),
                ),
                HeaderClass::ContentDisposition => HeaderValue::Disposition(
                    params::parse_content_disposition_with(&self.raw_value, &mut warnings),
                ),
                HeaderClass::Text => HeaderValue::Text(header::decode_encoded_words_with(
                    &self.raw_value,
                    &mut warnings,
                )),
            };
            Decoded { value, warnings }
        })
    }
}

/// Equality ignores whether the typed value has been decoded yet.
impl PartialEq for HeaderField {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.raw_value == other.raw_value
    }
}

impl Eq for HeaderField {}

//! `mailtree`: a lenient MIME email parser.
//!
//! This crate turns raw RFC 5322 / MIME bytes into an immutable tree of
//! [`Part`]s with decoded headers, decoded bodies, and derived attachment
//! descriptors. Malformed input degrades to partial results plus
//! [`DecodeWarning`]s; only resource limits and strict-mode header errors
//! fail a parse.
//!
//! ```
//! use mailtree::{Message, ParserConfig};
//!
//! let raw = b"From: Jane <jane@example.com>\r\nSubject: Hi\r\n\r\nHello\r\n";
//! let msg = Message::parse(raw, &ParserConfig::default()).unwrap();
//! assert_eq!(msg.subject().as_deref(), Some("Hi"));
//! assert_eq!(msg.text_content(), "Hello\r\n");
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod parser;

pub use config::{Config, ParserConfig};
pub use error::{MailError, Result};
pub use model::address::AddressEntry;
pub use model::attachment::AttachmentDescriptor;
pub use model::content_type::{ContentDisposition, ContentTypeDescriptor};
pub use model::header::{HeaderClass, HeaderField, HeaderValue};
pub use model::message::{Body, DecodedContent, Message, Part};
pub use model::warning::DecodeWarning;

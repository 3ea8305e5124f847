//! The parsed message tree and its read-only accessors.

use chrono::{DateTime, Utc};

use super::address::AddressEntry;
use super::attachment::AttachmentDescriptor;
use super::content_type::{ContentDisposition, ContentTypeDescriptor};
use super::header::HeaderField;
use super::warning::DecodeWarning;
use crate::config::ParserConfig;
use crate::error::Result;
use crate::parser::{header, mime};

/// Body of a leaf part after transfer decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedContent {
    /// `text/*` parts, converted from their declared charset.
    Text(String),
    /// Everything else, as raw decoded bytes.
    Binary(Vec<u8>),
}

impl DecodedContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A part is either a leaf with content or a container with children, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Leaf(DecodedContent),
    Multipart(Vec<Part>),
}

/// One MIME entity: its headers, effective content type, and body.
///
/// Parts are built once by the parser and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    headers: Vec<HeaderField>,
    content_type: ContentTypeDescriptor,
    body: Body,
    warnings: Vec<DecodeWarning>,
}

impl Part {
    pub(crate) fn new(
        headers: Vec<HeaderField>,
        content_type: ContentTypeDescriptor,
        body: Body,
        warnings: Vec<DecodeWarning>,
    ) -> Self {
        Self {
            headers,
            content_type,
            body,
            warnings,
        }
    }

    /// All header fields in original order, duplicates included.
    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    /// First header with this name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers.iter().find(|h| h.is(name))
    }

    /// Every header with this name, in order.
    pub fn headers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderField> {
        self.headers.iter().filter(move |h| h.is(name))
    }

    /// Effective content type: the declared one, or the RFC 2045 / RFC 2046 default.
    pub fn content_type(&self) -> &ContentTypeDescriptor {
        &self.content_type
    }

    pub fn disposition(&self) -> Option<&ContentDisposition> {
        self.header("content-disposition")?.disposition()
    }

    /// Declared transfer encoding, lowercased; `"7bit"` when absent.
    pub fn transfer_encoding(&self) -> String {
        self.header("content-transfer-encoding")
            .map(|h| h.raw_value().trim().trim_matches('"').to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "7bit".to_string())
    }

    /// `Content-ID` without angle brackets.
    pub fn content_id(&self) -> Option<String> {
        self.header("content-id")
            .map(|h| header::extract_msg_id(h.raw_value()))
            .filter(|id| !id.is_empty())
    }

    /// Filename from `Content-Disposition`, else the `Content-Type` `name` parameter.
    pub fn filename(&self) -> Option<&str> {
        self.disposition()
            .and_then(|d| d.filename())
            .or_else(|| self.content_type.param("name").filter(|n| !n.is_empty()))
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, Body::Leaf(_))
    }

    /// Decoded content of a leaf part.
    pub fn content(&self) -> Option<&DecodedContent> {
        match &self.body {
            Body::Leaf(content) => Some(content),
            Body::Multipart(_) => None,
        }
    }

    /// Decoded text of a `text/*` leaf.
    pub fn text(&self) -> Option<&str> {
        self.content()?.as_text()
    }

    /// Child parts of a container; empty for leaves.
    pub fn children(&self) -> &[Part] {
        match &self.body {
            Body::Multipart(children) => children,
            Body::Leaf(_) => &[],
        }
    }

    /// A leaf whose disposition is `attachment`, or whose type is anything
    /// other than `text/plain`, `text/html` or `multipart/*`.
    pub fn is_attachment(&self) -> bool {
        if !self.is_leaf() {
            return false;
        }
        if self.disposition().is_some_and(|d| d.is_attachment()) {
            return true;
        }
        let ct = &self.content_type;
        !(ct.is("text", "plain") || ct.is("text", "html") || ct.is_multipart())
    }

    /// This part and all its descendants, depth-first in document order.
    pub fn parts(&self) -> Parts<'_> {
        Parts { stack: vec![self] }
    }

    /// First leaf in depth-first order with the given media type.
    pub fn find_leaf(&self, primary: &str, sub: &str) -> Option<&Part> {
        self.parts()
            .find(|p| p.is_leaf() && p.content_type.is(primary, sub))
    }

    /// Decoded text of the first `text/plain` leaf, or `""`.
    pub fn text_content(&self) -> &str {
        self.find_leaf("text", "plain")
            .and_then(Part::text)
            .unwrap_or("")
    }

    /// Decoded text of the first `text/html` leaf, or `""`.
    pub fn html_content(&self) -> &str {
        self.find_leaf("text", "html")
            .and_then(Part::text)
            .unwrap_or("")
    }

    /// Every attachment leaf in document order.
    pub fn attachment_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts().filter(|p| p.is_attachment())
    }

    /// Warnings recorded while building this part (structure, transfer
    /// encoding, charset), not including its header fields.
    pub fn decode_warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Header-field warnings followed by build warnings, for this part only.
    pub fn warnings(&self) -> Vec<&DecodeWarning> {
        self.headers
            .iter()
            .flat_map(|h| h.warnings())
            .chain(self.warnings.iter())
            .collect()
    }

    /// Parse the content of a `message/rfc822` leaf as a message of its own.
    pub fn embedded_message(&self, config: &ParserConfig) -> Option<Result<Message>> {
        if !self.content_type.is("message", "rfc822") {
            return None;
        }
        let content = self.content()?;
        Some(Message::parse(content.as_bytes(), config))
    }
}

/// Depth-first, pre-order iterator over a part tree.
pub struct Parts<'a> {
    stack: Vec<&'a Part>,
}

impl<'a> Iterator for Parts<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.children().iter().rev());
        Some(part)
    }
}

/// A parsed email message: the root [`Part`] plus message-level accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    root: Part,
}

impl Message {
    pub(crate) fn new(root: Part) -> Self {
        Self { root }
    }

    /// Parse a complete raw message (headers and body).
    pub fn parse(data: &[u8], config: &ParserConfig) -> Result<Self> {
        mime::parse_message(data, config)
    }

    /// Parse with the default [`ParserConfig`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(data, &ParserConfig::default())
    }

    pub fn root(&self) -> &Part {
        &self.root
    }

    pub fn into_root(self) -> Part {
        self.root
    }

    pub fn headers(&self) -> &[HeaderField] {
        self.root.headers()
    }

    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.root.header(name)
    }

    pub fn content_type(&self) -> &ContentTypeDescriptor {
        self.root.content_type()
    }

    /// Addresses of the first header with this name; empty when absent.
    pub fn addresses(&self, name: &str) -> &[AddressEntry] {
        self.header(name)
            .and_then(HeaderField::addresses)
            .unwrap_or(&[])
    }

    /// First mailbox of `From`.
    pub fn from(&self) -> Option<&AddressEntry> {
        self.addresses("from").first()
    }

    pub fn sender(&self) -> Option<&AddressEntry> {
        self.addresses("sender").first()
    }

    pub fn to(&self) -> &[AddressEntry] {
        self.addresses("to")
    }

    pub fn cc(&self) -> &[AddressEntry] {
        self.addresses("cc")
    }

    pub fn bcc(&self) -> &[AddressEntry] {
        self.addresses("bcc")
    }

    pub fn reply_to(&self) -> &[AddressEntry] {
        self.addresses("reply-to")
    }

    /// Decoded `Subject`.
    pub fn subject(&self) -> Option<String> {
        self.header("subject").map(HeaderField::text)
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.header("date")?.date()
    }

    /// `Message-ID` without angle brackets.
    pub fn message_id(&self) -> Option<String> {
        self.header("message-id")
            .map(|h| header::extract_msg_id(h.raw_value()))
            .filter(|id| !id.is_empty())
    }

    pub fn in_reply_to(&self) -> Option<String> {
        self.header("in-reply-to")
            .map(|h| header::extract_msg_id(h.raw_value()))
            .filter(|id| !id.is_empty())
    }

    /// Identifiers from `References`, oldest first.
    pub fn references(&self) -> Vec<String> {
        self.header("references")
            .map(|h| header::extract_all_msg_ids(h.raw_value()))
            .unwrap_or_default()
    }

    pub fn text_content(&self) -> &str {
        self.root.text_content()
    }

    pub fn html_content(&self) -> &str {
        self.root.html_content()
    }

    /// Every part of the tree, depth-first in document order.
    pub fn parts(&self) -> Parts<'_> {
        self.root.parts()
    }

    /// Attachment leaves in document order.
    pub fn attachment_parts(&self) -> impl Iterator<Item = &Part> {
        self.root.attachment_parts()
    }

    /// Descriptors for every attachment, in document order.
    pub fn attachments(&self) -> Vec<AttachmentDescriptor<'_>> {
        self.attachment_parts()
            .filter_map(AttachmentDescriptor::from_part)
            .collect()
    }

    /// Every warning in the tree, part by part in document order.
    pub fn warnings(&self) -> Vec<&DecodeWarning> {
        self.parts().flat_map(Part::warnings).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(ct: ContentTypeDescriptor, headers: Vec<HeaderField>, text: &str) -> Part {
        let content = if ct.is_text() {
            DecodedContent::Text(text.to_string())
        } else {
            DecodedContent::Binary(text.as_bytes().to_vec())
        };
        Part::new(headers, ct, Body::Leaf(content), Vec::new())
    }

    fn sample_tree() -> Part {
        let plain = leaf(ContentTypeDescriptor::new("text", "plain"), vec![], "plain body");
        let html = leaf(ContentTypeDescriptor::new("text", "html"), vec![], "<p>html</p>");
        let alternative = Part::new(
            vec![],
            ContentTypeDescriptor::new("multipart", "alternative"),
            Body::Multipart(vec![plain, html]),
            vec![],
        );
        let image = leaf(
            ContentTypeDescriptor::new("image", "png"),
            vec![
                HeaderField::new("Content-Disposition", "inline; filename=\"logo.png\""),
                HeaderField::new("Content-ID", "<logo@x>"),
            ],
            "PNG",
        );
        let notes = leaf(
            ContentTypeDescriptor::new("text", "plain"),
            vec![HeaderField::new("Content-Disposition", "attachment; filename=notes.txt")],
            "notes",
        );
        Part::new(
            vec![],
            ContentTypeDescriptor::new("multipart", "mixed"),
            Body::Multipart(vec![alternative, image, notes]),
            vec![],
        )
    }

    #[test]
    fn test_parts_preorder() {
        let root = sample_tree();
        let types: Vec<String> = root.parts().map(|p| p.content_type().mime_type()).collect();
        assert_eq!(
            types,
            vec![
                "multipart/mixed",
                "multipart/alternative",
                "text/plain",
                "text/html",
                "image/png",
                "text/plain"
            ]
        );
    }

    #[test]
    fn test_text_and_html_content() {
        let root = sample_tree();
        assert_eq!(root.text_content(), "plain body");
        assert_eq!(root.html_content(), "<p>html</p>");
    }

    #[test]
    fn test_attachment_classification() {
        let root = sample_tree();
        let names: Vec<Option<&str>> = root.attachment_parts().map(Part::filename).collect();
        assert_eq!(names, vec![Some("logo.png"), Some("notes.txt")]);
        assert!(!root.is_attachment());
    }

    #[test]
    fn test_attachment_descriptor() {
        let root = sample_tree();
        let image = root.attachment_parts().next().unwrap();
        let desc = AttachmentDescriptor::from_part(image).unwrap();
        assert_eq!(desc.mime_type, "image/png");
        assert_eq!(desc.content, b"PNG");
        assert_eq!(desc.content_id.as_deref(), Some("logo@x"));
        assert!(desc.is_inline);
        assert_eq!(desc.transfer_encoding, "7bit");
        assert_eq!(desc.size(), 3);
        assert!(AttachmentDescriptor::from_part(&root).is_none());
    }

    #[test]
    fn test_filename_falls_back_to_content_type_name() {
        let mut ct = ContentTypeDescriptor::new("application", "pdf");
        ct.params.insert("name".to_string(), "typed.pdf".to_string());
        let part = leaf(ct, vec![], "x");
        assert_eq!(part.filename(), Some("typed.pdf"));

        let desc = AttachmentDescriptor::from_part(&part).unwrap();
        assert_eq!(desc.filename_or(0), "typed.pdf");
    }

    #[test]
    fn test_empty_leaf_accessors() {
        let part = leaf(ContentTypeDescriptor::new("image", "gif"), vec![], "");
        assert_eq!(part.text_content(), "");
        assert_eq!(part.html_content(), "");
        assert!(part.children().is_empty());
        assert!(part.content().unwrap().is_empty());
    }

    #[test]
    fn test_message_address_accessors_absent_safe() {
        let msg = Message::new(leaf(ContentTypeDescriptor::default_text("us-ascii"), vec![], ""));
        assert!(msg.from().is_none());
        assert!(msg.to().is_empty());
        assert!(msg.subject().is_none());
        assert!(msg.date().is_none());
        assert!(msg.references().is_empty());
    }
}

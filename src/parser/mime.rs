//! MIME tree construction (RFC 2045, RFC 2046).
//!
//! Every part runs through the same pipeline: header tokenizer, header
//! decoder, then either a boundary split (for `multipart/*`) recursing into
//! each segment, or transfer decoding of a leaf body.

use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::error::{MailError, Result};
use crate::model::content_type::ContentTypeDescriptor;
use crate::model::header::HeaderField;
use crate::model::message::{Body, DecodedContent, Message, Part};
use crate::model::warning::DecodeWarning;
use crate::parser::{header, tokenizer, transfer};

/// Multipart subtypes with a registered meaning. Anything else is still
/// split into children, with a warning.
const KNOWN_MULTIPART: &[&str] = &[
    "mixed",
    "alternative",
    "related",
    "signed",
    "encrypted",
    "digest",
    "parallel",
    "report",
];

/// Parse a complete raw message into a part tree.
///
/// A leading UTF-8 BOM and mbox `From ` separator line are skipped.
pub fn parse_message(data: &[u8], config: &ParserConfig) -> Result<Message> {
    let data = tokenizer::skip_preamble(data);
    debug!(bytes = data.len(), "Parsing message");

    let mut builder = TreeBuilder {
        config,
        decoded_bytes: 0,
    };
    let root = builder.build_part(data, 0, false)?;

    debug!(
        parts = root.parts().count(),
        decoded_bytes = builder.decoded_bytes,
        "Message parsed"
    );
    Ok(Message::new(root))
}

/// Per-parse state: the configuration and the running decoded-size total.
struct TreeBuilder<'c> {
    config: &'c ParserConfig,
    decoded_bytes: usize,
}

impl TreeBuilder<'_> {
    fn build_part(&mut self, data: &[u8], depth: usize, in_digest: bool) -> Result<Part> {
        if depth > self.config.max_nesting_depth {
            return Err(MailError::ExcessiveNesting {
                limit: self.config.max_nesting_depth,
            });
        }

        // Body parts may end right after their headers (RFC 2046 §5.1.1);
        // strict termination binds only the top level.
        let strict = depth == 0 && self.config.strict_header_termination;
        let block = tokenizer::read_header_block(data, 0, strict)?;
        let headers = header::parse_header_fields(&block.lines, &self.config.default_charset);
        let content_type = self.effective_content_type(&headers, in_digest);
        let body = block.body();
        let mut warnings = Vec::new();

        if content_type.is_multipart() {
            match content_type.boundary().map(str::to_owned) {
                Some(boundary) => {
                    let children = self.build_children(
                        body,
                        &boundary,
                        &content_type,
                        depth,
                        &mut warnings,
                    )?;
                    return Ok(Part::new(
                        headers,
                        content_type,
                        Body::Multipart(children),
                        warnings,
                    ));
                }
                None => record(&mut warnings, DecodeWarning::MissingBoundary),
            }
        }

        let content = self.decode_leaf(&headers, &content_type, body, &mut warnings)?;
        Ok(Part::new(headers, content_type, Body::Leaf(content), warnings))
    }

    /// The declared `Content-Type`, or the context default when it is
    /// missing or unusable.
    fn effective_content_type(
        &self,
        headers: &[HeaderField],
        in_digest: bool,
    ) -> ContentTypeDescriptor {
        headers
            .iter()
            .find(|h| h.is("content-type"))
            .and_then(HeaderField::content_type)
            .cloned()
            .unwrap_or_else(|| {
                if in_digest {
                    ContentTypeDescriptor::new("message", "rfc822")
                } else {
                    ContentTypeDescriptor::default_text(&self.config.default_charset)
                }
            })
    }

    fn build_children(
        &mut self,
        body: &[u8],
        boundary: &str,
        content_type: &ContentTypeDescriptor,
        depth: usize,
        warnings: &mut Vec<DecodeWarning>,
    ) -> Result<Vec<Part>> {
        if !KNOWN_MULTIPART.contains(&content_type.sub.as_str()) {
            record(
                warnings,
                DecodeWarning::UnknownMultipartSubtype {
                    subtype: content_type.sub.clone(),
                },
            );
        }

        let split = split_multipart(body, boundary.as_bytes());
        if !split.closed {
            record(
                warnings,
                DecodeWarning::UnterminatedMultipart {
                    boundary: boundary.to_string(),
                },
            );
        }
        trace!(
            boundary,
            segments = split.segments.len(),
            depth,
            "Split multipart body"
        );

        let in_digest = content_type.sub == "digest";
        split
            .segments
            .into_iter()
            .map(|segment| self.build_part(segment, depth + 1, in_digest))
            .collect()
    }

    fn decode_leaf(
        &mut self,
        headers: &[HeaderField],
        content_type: &ContentTypeDescriptor,
        body: &[u8],
        warnings: &mut Vec<DecodeWarning>,
    ) -> Result<DecodedContent> {
        let transfer_encoding = headers
            .iter()
            .find(|h| h.is("content-transfer-encoding"))
            .map(HeaderField::raw_value);

        // Multipart without a boundary is kept readable as text.
        let text_charset = if content_type.is_text() || content_type.is_multipart() {
            Some(
                content_type
                    .charset()
                    .unwrap_or(self.config.default_charset.as_str()),
            )
        } else {
            None
        };

        let content = transfer::decode_body(transfer_encoding, text_charset, body, warnings);

        let attempted = self.decoded_bytes.saturating_add(content.len());
        if attempted > self.config.max_decoded_bytes {
            return Err(MailError::ResourceLimitExceeded {
                limit: self.config.max_decoded_bytes,
                attempted,
            });
        }
        self.decoded_bytes = attempted;
        Ok(content)
    }
}

fn record(warnings: &mut Vec<DecodeWarning>, warning: DecodeWarning) {
    warning.log();
    warnings.push(warning);
}

/// Body segments between boundary delimiters.
#[derive(Debug, PartialEq, Eq)]
pub struct MultipartSplit<'a> {
    /// Segments in document order; preamble and epilogue excluded.
    pub segments: Vec<&'a [u8]>,
    /// `true` when the closing `--boundary--` line was seen.
    pub closed: bool,
}

/// What a single body line means relative to the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Open,
    Close,
}

fn classify_line(line: &[u8], boundary: &[u8]) -> Option<Delimiter> {
    let rest = line.strip_prefix(b"--")?.strip_prefix(boundary)?;
    let (kind, tail) = match rest.strip_prefix(b"--") {
        Some(tail) => (Delimiter::Close, tail),
        None => (Delimiter::Open, rest),
    };
    // Trailing whitespace is allowed; anything else means a longer boundary.
    tail.iter()
        .all(|b| *b == b' ' || *b == b'\t')
        .then_some(kind)
}

/// Split a multipart body on `--boundary` lines.
///
/// The line break before each delimiter belongs to the delimiter. Text
/// before the first delimiter and after the closing one is discarded. When
/// the closing delimiter is missing the last segment runs to end of input.
pub fn split_multipart<'a>(body: &'a [u8], boundary: &[u8]) -> MultipartSplit<'a> {
    let mut segments = Vec::new();
    let mut segment_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let (line, next) = tokenizer::next_line(body, pos);
        if let Some(kind) = classify_line(line, boundary) {
            if let Some(start) = segment_start {
                segments.push(trim_delimiter_break(&body[start..pos]));
            }
            if kind == Delimiter::Close {
                return MultipartSplit {
                    segments,
                    closed: true,
                };
            }
            segment_start = Some(next);
        }
        pos = next;
    }

    if let Some(start) = segment_start {
        segments.push(&body[start.min(body.len())..]);
    }
    MultipartSplit {
        segments,
        closed: false,
    }
}

fn trim_delimiter_break(segment: &[u8]) -> &[u8] {
    let segment = segment.strip_suffix(b"\n").unwrap_or(segment);
    segment.strip_suffix(b"\r").unwrap_or(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Message {
        parse_message(data, &ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_split_basic() {
        let body = b"preamble\r\n--xyz\r\nA: 1\r\n\r\none\r\n--xyz\r\n\r\ntwo\r\n--xyz--\r\nepilogue\r\n";
        let split = split_multipart(body, b"xyz");
        assert!(split.closed);
        assert_eq!(
            split.segments,
            vec![&b"A: 1\r\n\r\none"[..], &b"\r\ntwo"[..]]
        );
    }

    #[test]
    fn test_split_prefix_is_not_a_delimiter() {
        let body = b"--abc\n\nfirst\n--abcdef\nstill first\n--abc \n\nsecond\n--abc--\n";
        let split = split_multipart(body, b"abc");
        assert_eq!(
            split.segments,
            vec![&b"\nfirst\n--abcdef\nstill first"[..], &b"\nsecond"[..]]
        );
    }

    #[test]
    fn test_split_unterminated() {
        let body = b"--b\n\none\n--b\n\ntwo\n";
        let split = split_multipart(body, b"b");
        assert!(!split.closed);
        assert_eq!(split.segments, vec![&b"\none"[..], &b"\ntwo\n"[..]]);
    }

    #[test]
    fn test_split_no_delimiters() {
        let split = split_multipart(b"just text\n", b"b");
        assert!(split.segments.is_empty());
        assert!(!split.closed);
    }

    #[test]
    fn test_default_content_type() {
        let msg = parse(b"Subject: x\n\nhello\n");
        assert_eq!(msg.content_type().mime_type(), "text/plain");
        assert_eq!(msg.content_type().charset(), Some("us-ascii"));
        assert_eq!(msg.text_content(), "hello\n");
    }

    #[test]
    fn test_nested_multipart() {
        let raw = b"Content-Type: multipart/mixed; boundary=outer\n\n\
--outer\n\
Content-Type: multipart/alternative; boundary=inner\n\n\
--inner\n\
Content-Type: text/plain\n\nplain\n\
--inner\n\
Content-Type: text/html\n\n<b>html</b>\n\
--inner--\n\
--outer\n\
Content-Type: application/octet-stream\n\
Content-Transfer-Encoding: base64\n\nAAEC\n\
--outer--\n";
        let msg = parse(raw);
        let root = msg.root();
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].children().len(), 2);
        assert_eq!(msg.text_content(), "plain");
        assert_eq!(msg.html_content(), "<b>html</b>");
        let attachment = &root.children()[1];
        assert_eq!(
            attachment.content(),
            Some(&DecodedContent::Binary(vec![0, 1, 2]))
        );
        assert!(msg.warnings().is_empty());
    }

    #[test]
    fn test_digest_children_default_to_rfc822() {
        let raw = b"Content-Type: multipart/digest; boundary=d\n\n\
--d\n\n\
From: a@x.test\nSubject: inner\n\ninner body\n\
--d--\n";
        let msg = parse(raw);
        let child = &msg.root().children()[0];
        assert!(child.content_type().is("message", "rfc822"));
        assert!(child.is_attachment());

        let inner = child
            .embedded_message(&ParserConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(inner.subject().as_deref(), Some("inner"));
        assert_eq!(inner.text_content(), "inner body");
    }

    #[test]
    fn test_missing_boundary_becomes_text_leaf() {
        let msg = parse(b"Content-Type: multipart/mixed\n\nraw text\n");
        assert!(msg.root().is_leaf());
        assert_eq!(msg.root().text(), Some("raw text\n"));
        assert_eq!(msg.warnings(), vec![&DecodeWarning::MissingBoundary]);
    }

    #[test]
    fn test_unknown_subtype_and_unterminated() {
        let raw = b"Content-Type: multipart/x-custom; boundary=q\n\n--q\n\nonly\n";
        let msg = parse(raw);
        assert_eq!(msg.root().children().len(), 1);
        let warnings = msg.warnings();
        assert!(warnings.contains(&&DecodeWarning::UnknownMultipartSubtype {
            subtype: "x-custom".into()
        }));
        assert!(warnings.contains(&&DecodeWarning::UnterminatedMultipart {
            boundary: "q".into()
        }));
    }

    #[test]
    fn test_nesting_limit() {
        let config = ParserConfig {
            max_nesting_depth: 2,
            ..ParserConfig::default()
        };
        let mut raw = Vec::new();
        for level in 0..4 {
            raw.extend_from_slice(
                format!("Content-Type: multipart/mixed; boundary=b{level}\n\n--b{level}\n")
                    .as_bytes(),
            );
        }
        raw.extend_from_slice(b"\nleaf\n");
        let err = parse_message(&raw, &config).unwrap_err();
        assert!(matches!(err, MailError::ExcessiveNesting { limit: 2 }));
    }

    #[test]
    fn test_decoded_size_limit() {
        let config = ParserConfig {
            max_decoded_bytes: 4,
            ..ParserConfig::default()
        };
        let err = parse_message(b"Subject: big\n\n0123456789\n", &config).unwrap_err();
        assert!(matches!(
            err,
            MailError::ResourceLimitExceeded { limit: 4, attempted: 11 }
        ));
    }

    #[test]
    fn test_strict_mode_propagates() {
        let config = ParserConfig {
            strict_header_termination: true,
            ..ParserConfig::default()
        };
        let err = parse_message(b"Subject: no body", &config).unwrap_err();
        assert!(matches!(err, MailError::MalformedHeader { offset: 0 }));
        assert!(parse_message(b"Subject: no body", &ParserConfig::default()).is_ok());
    }

    #[test]
    fn test_strict_mode_accepts_header_only_body_parts() {
        let config = ParserConfig {
            strict_header_termination: true,
            ..ParserConfig::default()
        };
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n\
--b\r\nContent-Type: text/plain\r\n\r\n\
--b\r\nContent-Type: text/plain\r\n\r\nsecond\r\n\
--b--\r\n";
        let msg = parse_message(raw, &config).unwrap();
        let children = msg.root().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].text(), Some(""));
        assert_eq!(children[1].text(), Some("second"));
        assert!(children[0].headers()[0].is("content-type"));
    }

    #[test]
    fn test_mbox_separator_skipped() {
        let msg = parse(b"From someone@x.test Mon Sep 25 12:00:00 2023\nSubject: hi\n\nbody");
        assert_eq!(msg.subject().as_deref(), Some("hi"));
        assert_eq!(msg.text_content(), "body");
    }
}

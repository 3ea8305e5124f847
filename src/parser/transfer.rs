//! Content-Transfer-Encoding decoding (RFC 2045 §6) and text conversion.
//!
//! Both decoders are lenient: garbage is skipped or kept literally and
//! reported as a [`DecodeWarning`], never as an error.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::model::message::DecodedContent;
use crate::model::warning::DecodeWarning;
use crate::parser::charset;

/// Padding is stripped before decoding, so the engine must not require it.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// A recognized `Content-Transfer-Encoding` mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
}

impl TransferEncoding {
    /// Classify a header value. `None` means the mechanism is unknown.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().trim_matches('"').trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "7bit" => Some(Self::SevenBit),
            "8bit" => Some(Self::EightBit),
            "binary" => Some(Self::Binary),
            "base64" => Some(Self::Base64),
            "quoted-printable" => Some(Self::QuotedPrintable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
        }
    }
}

/// Undo the transfer encoding of `raw` and, when `text_charset` is given,
/// convert the result to a string.
///
/// `transfer_encoding` is the raw header value (absent means `7bit`).
/// `text_charset` is `Some` exactly for text parts.
pub fn decode_body(
    transfer_encoding: Option<&str>,
    text_charset: Option<&str>,
    raw: &[u8],
    warnings: &mut Vec<DecodeWarning>,
) -> DecodedContent {
    let encoding = match transfer_encoding {
        None => Some(TransferEncoding::SevenBit),
        Some(value) => TransferEncoding::parse(value),
    };

    let bytes: Cow<'_, [u8]> = match encoding {
        Some(TransferEncoding::Base64) => Cow::Owned(decode_base64(raw, warnings)),
        Some(TransferEncoding::QuotedPrintable) => {
            Cow::Owned(decode_quoted_printable(raw, warnings))
        }
        Some(TransferEncoding::SevenBit | TransferEncoding::EightBit | TransferEncoding::Binary) => {
            Cow::Borrowed(raw)
        }
        None => {
            let warning = DecodeWarning::UnknownTransferEncoding {
                encoding: transfer_encoding.unwrap_or_default().trim().to_string(),
            };
            warning.log();
            warnings.push(warning);
            Cow::Borrowed(raw)
        }
    };

    match text_charset {
        Some(cs) => DecodedContent::Text(charset::decode_text(&bytes, cs, warnings)),
        None => DecodedContent::Binary(bytes.into_owned()),
    }
}

/// Decode base64 (RFC 4648 alphabet), ignoring line breaks and whitespace.
///
/// Characters outside the alphabet are skipped. `=` ends a quantum, so
/// concatenated padded blocks decode one after the other. A dangling
/// single character at the end of a block is dropped.
pub fn decode_base64(input: &[u8], warnings: &mut Vec<DecodeWarning>) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() / 4 * 3 + 3);
    let mut block: Vec<u8> = Vec::with_capacity(input.len());
    let mut skipped = 0usize;
    let mut truncated = false;

    for &b in input {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' => block.push(b),
            b'=' => flush_base64_block(&mut block, &mut out, &mut truncated, warnings),
            b' ' | b'\t' | b'\r' | b'\n' => {}
            _ => skipped += 1,
        }
    }
    flush_base64_block(&mut block, &mut out, &mut truncated, warnings);

    if skipped > 0 {
        let warning = DecodeWarning::InvalidBase64 { skipped };
        warning.log();
        warnings.push(warning);
    }
    if truncated {
        let warning = DecodeWarning::TruncatedBase64;
        warning.log();
        warnings.push(warning);
    }
    out
}

fn flush_base64_block(
    block: &mut Vec<u8>,
    out: &mut Vec<u8>,
    truncated: &mut bool,
    warnings: &mut Vec<DecodeWarning>,
) {
    if block.is_empty() {
        return;
    }
    if block.len() % 4 == 1 {
        block.pop();
        *truncated = true;
    }
    if let Err(e) = LENIENT_BASE64.decode_vec(&block[..], out) {
        tracing::debug!(error = %e, "base64 block rejected");
        let warning = DecodeWarning::InvalidBase64 {
            skipped: block.len(),
        };
        warning.log();
        warnings.push(warning);
    }
    block.clear();
}

/// Decode quoted-printable: `=XX` escapes and `=` soft line breaks.
///
/// Trailing whitespace on each line is transport padding and is removed
/// (RFC 2045 §6.7 rule 3). Invalid escapes pass through literally.
pub fn decode_quoted_printable(input: &[u8], warnings: &mut Vec<DecodeWarning>) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut invalid = 0usize;

    for line in input.split_inclusive(|&b| b == b'\n') {
        let (content, newline) = split_line_ending(line);
        let content = trim_trailing_lwsp(content);
        let (content, soft_break) = match content.strip_suffix(b"=") {
            Some(c) => (c, true),
            None => (content, false),
        };

        let mut i = 0;
        while i < content.len() {
            let b = content[i];
            if b == b'=' {
                let hex = content
                    .get(i + 1..i + 3)
                    .and_then(|pair| Some((hex_val(pair[0])?, hex_val(pair[1])?)));
                if let Some((hi, lo)) = hex {
                    out.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
                invalid += 1;
            }
            out.push(b);
            i += 1;
        }

        if !soft_break {
            out.extend_from_slice(newline);
        }
    }

    if invalid > 0 {
        let warning = DecodeWarning::InvalidQuotedPrintable { count: invalid };
        warning.log();
        warnings.push(warning);
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Split a line into its content and its `\r\n` / `\n` terminator.
fn split_line_ending(line: &[u8]) -> (&[u8], &[u8]) {
    if line.ends_with(b"\r\n") {
        line.split_at(line.len() - 2)
    } else if line.ends_with(b"\n") {
        line.split_at(line.len() - 1)
    } else {
        (line, &[])
    }
}

fn trim_trailing_lwsp(mut s: &[u8]) -> &[u8] {
    while let [rest @ .., b' ' | b'\t'] = s {
        s = rest;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(input: &str) -> (Vec<u8>, Vec<DecodeWarning>) {
        let mut warnings = Vec::new();
        let out = decode_base64(input.as_bytes(), &mut warnings);
        (out, warnings)
    }

    fn qp(input: &str) -> (Vec<u8>, Vec<DecodeWarning>) {
        let mut warnings = Vec::new();
        let out = decode_quoted_printable(input.as_bytes(), &mut warnings);
        (out, warnings)
    }

    #[test]
    fn test_base64_with_line_breaks() {
        let (out, warnings) = b64("SGVsbG8s\r\nIHdv\ncmxk\t IQ==\r\n");
        assert_eq!(out, b"Hello, world!");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_base64_skips_garbage() {
        let (out, warnings) = b64("JVBERi0xLjQKJ...");
        assert_eq!(out, b"%PDF-1.4\n");
        assert!(warnings.contains(&DecodeWarning::InvalidBase64 { skipped: 3 }));
        assert!(warnings.contains(&DecodeWarning::TruncatedBase64));
    }

    #[test]
    fn test_base64_unpadded() {
        let (out, warnings) = b64("SGk");
        assert_eq!(out, b"Hi");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_base64_concatenated_blocks() {
        let (out, _) = b64("QQ==Qg==");
        assert_eq!(out, b"AB");
    }

    #[test]
    fn test_base64_roundtrip() {
        let original: Vec<u8> = (0u8..=255).collect();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&original);
        let (decoded, warnings) = b64(&encoded);
        assert_eq!(decoded, original);
        assert!(warnings.is_empty());
        assert_eq!(base64::engine::general_purpose::STANDARD.encode(&decoded), encoded);
    }

    #[test]
    fn test_qp_escapes_and_soft_breaks() {
        let (out, warnings) = qp("caf=C3=A9 con le=\r\n=C3=B1a\r\nfin");
        assert_eq!(String::from_utf8(out).unwrap(), "café con leña\r\nfin");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_qp_invalid_escape_passthrough() {
        let (out, warnings) = qp("100% =ZZ sure =4");
        assert_eq!(out, b"100% =ZZ sure =4");
        assert_eq!(warnings, vec![DecodeWarning::InvalidQuotedPrintable { count: 2 }]);
    }

    #[test]
    fn test_qp_strips_transport_padding() {
        let (out, _) = qp("trailing   \nsoft = \nbreak");
        assert_eq!(out, b"trailing\nsoft break");
    }

    #[test]
    fn test_qp_lowercase_hex() {
        let (out, _) = qp("=e9t=e9");
        assert_eq!(out, b"\xE9t\xE9");
    }

    #[test]
    fn test_qp_roundtrip_fully_escaped() {
        let original: Vec<u8> = (0u8..=255).collect();
        let encoded: String = original.iter().map(|b| format!("={b:02X}")).collect();
        let (decoded, warnings) = qp(&encoded);
        assert_eq!(decoded, original);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_decode_body_text_charset() {
        let mut warnings = Vec::new();
        let content = decode_body(
            Some("quoted-printable"),
            Some("iso-8859-1"),
            b"R=E9sum=E9",
            &mut warnings,
        );
        assert_eq!(content, DecodedContent::Text("Résumé".to_string()));
    }

    #[test]
    fn test_decode_body_binary_passthrough() {
        let mut warnings = Vec::new();
        let content = decode_body(Some("8BIT"), None, b"\x00\x01\xFF", &mut warnings);
        assert_eq!(content, DecodedContent::Binary(vec![0x00, 0x01, 0xFF]));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_decode_body_unknown_encoding() {
        let mut warnings = Vec::new();
        let content = decode_body(Some("x-uuencode"), Some("us-ascii"), b"begin", &mut warnings);
        assert_eq!(content.as_text(), Some("begin"));
        assert_eq!(
            warnings,
            vec![DecodeWarning::UnknownTransferEncoding {
                encoding: "x-uuencode".to_string()
            }]
        );
    }

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse(" Base64 "), Some(TransferEncoding::Base64));
        assert_eq!(
            TransferEncoding::parse("Quoted-Printable"),
            Some(TransferEncoding::QuotedPrintable)
        );
        assert_eq!(TransferEncoding::parse("7BIT"), Some(TransferEncoding::SevenBit));
        assert_eq!(TransferEncoding::parse("gzip"), None);
    }
}

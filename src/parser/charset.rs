//! Charset conversion to Rust strings via `encoding_rs`.

use encoding_rs::Encoding;

use crate::model::warning::DecodeWarning;

/// Resolve a MIME charset label, tolerating quotes and an RFC 2231 language
/// suffix (`utf-8*en`). Returns `None` for labels `encoding_rs` does not know.
pub fn lookup(label: &str) -> Option<&'static Encoding> {
    let label = normalize_label(label);
    if label.is_empty() {
        return None;
    }
    match Encoding::for_label(label.as_bytes()) {
        // The WHATWG "replacement" encoding maps whole inputs to U+FFFD.
        Some(enc) if enc == encoding_rs::REPLACEMENT => None,
        Some(enc) => Some(enc),
        None => None,
    }
}

fn normalize_label(label: &str) -> &str {
    let label = label.trim().trim_matches('"').trim();
    match label.find('*') {
        Some(star) => &label[..star],
        None => label,
    }
}

/// Decode `bytes` declared as `charset`.
///
/// Unknown charsets never fail: valid UTF-8 is taken as is, anything else is
/// read as Windows-1252 (a superset of Latin-1), and a warning is recorded.
pub fn decode_text(bytes: &[u8], charset: &str, warnings: &mut Vec<DecodeWarning>) -> String {
    match lookup(charset) {
        Some(enc) if enc == encoding_rs::UTF_8 => {
            let bytes = bytes.strip_prefix(&b"\xEF\xBB\xBF"[..]).unwrap_or(bytes);
            String::from_utf8_lossy(bytes).into_owned()
        }
        Some(enc) => {
            let (decoded, _, _) = enc.decode(bytes);
            decoded.into_owned()
        }
        None => {
            let warning = DecodeWarning::UnknownCharset {
                charset: charset.trim().to_string(),
            };
            warning.log();
            warnings.push(warning);
            best_effort(bytes)
        }
    }
}

/// UTF-8 when valid, otherwise Windows-1252 (accepts every byte).
pub fn best_effort(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            decoded.into_owned()
        }
    }
}

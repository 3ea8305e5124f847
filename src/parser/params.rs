//! `Content-Type` / `Content-Disposition` values and their parameters
//! (RFC 2045 §5.1, RFC 2183, RFC 2231).

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

use crate::model::content_type::{ContentDisposition, ContentTypeDescriptor};
use crate::model::warning::DecodeWarning;
use crate::parser::charset;
use crate::parser::header::decode_encoded_words_with;

/// Parse a `Content-Type` value. `None` when the media type is malformed.
pub fn parse_content_type(value: &str) -> Option<ContentTypeDescriptor> {
    let mut warnings = Vec::new();
    parse_content_type_with(value, &mut warnings)
}

/// Like [`parse_content_type`], recording a [`DecodeWarning::MalformedContentType`]
/// for unusable values and charset problems in parameters.
pub fn parse_content_type_with(
    value: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<ContentTypeDescriptor> {
    let segments = split_segments(value);
    let media_type = segments.first().map(|s| strip_comment(s)).unwrap_or("");

    let Some((primary, sub)) = media_type.split_once('/') else {
        return malformed(value, warnings);
    };
    let (primary, sub) = (primary.trim(), sub.trim());
    if !is_token(primary) || !is_token(sub) {
        return malformed(value, warnings);
    }

    let mut ct = ContentTypeDescriptor::new(primary, sub);
    ct.params = parse_parameters(&segments[1..], warnings);
    Some(ct)
}

fn malformed(
    value: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Option<ContentTypeDescriptor> {
    let warning = DecodeWarning::MalformedContentType {
        value: value.trim().to_string(),
    };
    warning.log();
    warnings.push(warning);
    None
}

/// Parse a `Content-Disposition` value.
pub fn parse_content_disposition(value: &str) -> ContentDisposition {
    let mut warnings = Vec::new();
    parse_content_disposition_with(value, &mut warnings)
}

pub fn parse_content_disposition_with(
    value: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> ContentDisposition {
    let segments = split_segments(value);
    let kind = segments
        .first()
        .map(|s| strip_comment(s).to_ascii_lowercase())
        .unwrap_or_default();
    let params = if segments.len() > 1 {
        parse_parameters(&segments[1..], warnings)
    } else {
        BTreeMap::new()
    };
    ContentDisposition { kind, params }
}

/// One `name=value` parameter after unquoting, before merging.
struct RawParam {
    name: String,
    section: Option<u32>,
    extended: bool,
    value: String,
}

/// Decode a list of `name=value` segments into a name → value map.
///
/// Handles quoted strings, RFC 2231 continuations (`name*0`, `name*1*`, ...)
/// merged in numeric order, charset/language tagged values
/// (`name*=UTF-8''%E2%82%AC`), and RFC 2047 encoded words inside plain
/// values. Extended forms win over the plain form of the same name.
pub fn parse_parameters(
    segments: &[&str],
    warnings: &mut Vec<DecodeWarning>,
) -> BTreeMap<String, String> {
    let mut plain: BTreeMap<String, String> = BTreeMap::new();
    let mut extended: BTreeMap<String, String> = BTreeMap::new();
    let mut sections: BTreeMap<String, BTreeMap<u32, (bool, String)>> = BTreeMap::new();

    for param in segments.iter().filter_map(|s| parse_one(s)) {
        match (param.section, param.extended) {
            (None, false) => {
                let value = if param.name == "boundary" || !param.value.contains("=?") {
                    param.value
                } else {
                    decode_encoded_words_with(&param.value, warnings)
                };
                plain.entry(param.name).or_insert(value);
            }
            (None, true) => {
                let (cs, data) = split_charset(&param.value);
                let bytes: Vec<u8> = percent_decode_str(data).collect();
                let value = decode_param_bytes(&bytes, cs, warnings);
                extended.entry(param.name).or_insert(value);
            }
            (Some(index), ext) => {
                sections
                    .entry(param.name)
                    .or_default()
                    .entry(index)
                    .or_insert((ext, param.value));
            }
        }
    }

    let mut result = plain;
    for (name, parts) in sections {
        let mut bytes = Vec::new();
        let mut cs = None;
        for (index, (ext, value)) in &parts {
            if *ext {
                let data = if *index == 0 {
                    let (charset, data) = split_charset(value);
                    cs = charset;
                    data
                } else {
                    value.as_str()
                };
                bytes.extend(percent_decode_str(data));
            } else {
                bytes.extend_from_slice(value.as_bytes());
            }
        }
        result.insert(name, decode_param_bytes(&bytes, cs, warnings));
    }
    result.extend(extended);
    result
}

fn parse_one(segment: &str) -> Option<RawParam> {
    let (name, value) = segment.split_once('=')?;
    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }

    let value = value.trim();
    let value = if value.starts_with('"') {
        unquote(value)
    } else {
        strip_comment(value).to_string()
    };

    let (base, extended) = match name.strip_suffix('*') {
        Some(base) => (base, true),
        None => (name.as_str(), false),
    };
    let (base, section) = match base.rsplit_once('*') {
        Some((head, digits)) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            (head, digits.parse::<u32>().ok())
        }
        _ => (base, None),
    };
    if base.is_empty() {
        return None;
    }

    Some(RawParam {
        name: base.to_string(),
        section,
        extended,
        value,
    })
}

/// Split `charset'language'data`. Without both quotes the whole value is data.
fn split_charset(value: &str) -> (Option<&str>, &str) {
    let mut parts = value.splitn(3, '\'');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(cs), Some(_lang), Some(data)) => ((!cs.is_empty()).then_some(cs), data),
        _ => (None, value),
    }
}

fn decode_param_bytes(bytes: &[u8], cs: Option<&str>, warnings: &mut Vec<DecodeWarning>) -> String {
    match cs {
        Some(cs) => charset::decode_text(bytes, cs, warnings),
        None => charset::best_effort(bytes),
    }
}

/// Split on `;` outside quoted strings.
fn split_segments(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, ch) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);
    segments
        .into_iter()
        .map(str::trim)
        .enumerate()
        .filter(|(i, s)| *i == 0 || !s.is_empty())
        .map(|(_, s)| s)
        .collect()
}

/// Remove the surrounding quotes of a quoted-string and its `\` escapes.
/// An unterminated quote runs to the end of the value.
fn unquote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().skip(1);
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => break,
            c => out.push(c),
        }
    }
    out
}

/// Drop a trailing ` (comment)`, as in `charset=us-ascii (Plain text)`.
fn strip_comment(value: &str) -> &str {
    let value = value.trim();
    if value.ends_with(')') {
        if let Some(open) = value.find(" (") {
            return value[..open].trim_end();
        }
    }
    value
}

/// RFC 2045 token: printable ASCII without spaces or tspecials.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b)
        })
}

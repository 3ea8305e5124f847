//! RFC 5322 header decoding: raw header bytes, encoded-words (RFC 2047),
//! message identifiers and date parsing.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::model::header::HeaderField;
use crate::model::warning::DecodeWarning;
use crate::parser::{charset, tokenizer, transfer};

/// Turn the logical lines of a header block into [`HeaderField`]s.
///
/// Lines without a colon are skipped. Raw bytes that are not UTF-8 are read
/// in `default_charset`.
pub fn parse_header_fields(lines: &[Vec<u8>], default_charset: &str) -> Vec<HeaderField> {
    lines
        .iter()
        .filter_map(|line| {
            let (name, value) = tokenizer::split_field(line)?;
            Some(HeaderField::new(
                decode_header_bytes(name, default_charset),
                decode_header_bytes(value, default_charset),
            ))
        })
        .collect()
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then the configured default charset, then
/// Windows-1252 (which accepts every byte).
pub fn decode_header_bytes(bytes: &[u8], default_charset: &str) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let encoding = charset::lookup(default_charset).unwrap_or(encoding_rs::WINDOWS_1252);
            let (decoded, _) = encoding.decode_without_bom_handling(bytes);
            decoded.into_owned()
        }
    }
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// If decoding fails for any token, the original text is preserved.
pub fn decode_encoded_words(input: &str) -> String {
    let mut warnings = Vec::new();
    decode_encoded_words_with(input, &mut warnings)
}

/// Like [`decode_encoded_words`], recording charset and payload problems.
///
/// Adjacent encoded-words in the same charset are joined at the byte level
/// before conversion, since a multi-byte character may be split between them.
pub fn decode_encoded_words_with(input: &str, warnings: &mut Vec<DecodeWarning>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut pending: Option<(String, Vec<u8>)> = None;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        let after_start = &remaining[start + 2..];

        match try_decode_one_word(after_start, warnings) {
            Some(word) => {
                // Whitespace between two encoded words is not displayed (RFC 2047 §6.2)
                if pending.is_none() || !before.trim().is_empty() {
                    flush_pending(&mut pending, &mut result, warnings);
                    result.push_str(before);
                }
                match &mut pending {
                    Some((cs, bytes)) if cs.eq_ignore_ascii_case(&word.charset) => {
                        bytes.extend_from_slice(&word.bytes);
                    }
                    _ => {
                        flush_pending(&mut pending, &mut result, warnings);
                        pending = Some((word.charset, word.bytes));
                    }
                }
                remaining = &after_start[word.consumed..];
            }
            None => {
                flush_pending(&mut pending, &mut result, warnings);
                result.push_str(before);
                result.push_str("=?");
                remaining = after_start;
            }
        }
    }

    flush_pending(&mut pending, &mut result, warnings);
    result.push_str(remaining);
    result
}

fn flush_pending(
    pending: &mut Option<(String, Vec<u8>)>,
    result: &mut String,
    warnings: &mut Vec<DecodeWarning>,
) {
    if let Some((cs, bytes)) = pending.take() {
        result.push_str(&charset::decode_text(&bytes, &cs, warnings));
    }
}

struct DecodedWord {
    charset: String,
    bytes: Vec<u8>,
    consumed: usize, // bytes consumed from the string *after* the initial "=?"
}

fn try_decode_one_word(s: &str, warnings: &mut Vec<DecodeWarning>) -> Option<DecodedWord> {
    // Format: charset?encoding?encoded_text?=
    let first_q = s.find('?')?;
    let charset = &s[..first_q];
    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return None;
    }

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let rest2 = &rest[second_q + 1..];
    let end = rest2.find("?=")?;
    let encoded_text = &rest2[..end];

    let total_consumed = first_q + 1 + second_q + 1 + end + 2;

    let bytes = match encoding.to_uppercase().as_str() {
        "B" => transfer::decode_base64(encoded_text.as_bytes(), warnings),
        "Q" => decode_q_encoding(encoded_text),
        _ => return None,
    };

    Some(DecodedWord {
        charset: charset.to_string(),
        bytes,
        consumed: total_consumed,
    })
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit() =>
            {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("00");
                result.push(u8::from_str_radix(hex, 16).unwrap_or(0));
                i += 3;
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

/// Extract the identifier between `<` and `>` (for Message-ID, In-Reply-To,
/// Content-ID). Values without brackets are returned trimmed.
pub fn extract_msg_id(s: &str) -> String {
    let trimmed = s.trim();
    if let Some(start) = trimmed.find('<') {
        if let Some(end) = trimmed[start..].find('>') {
            return trimmed[start + 1..start + end].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Extract all `<…>` identifiers from a string (for the References header).
pub fn extract_all_msg_ids(s: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut remaining = s;
    while let Some(start) = remaining.find('<') {
        if let Some(end) = remaining[start..].find('>') {
            let id = remaining[start + 1..start + end].trim();
            if !id.is_empty() {
                result.push(id.to_string());
            }
            remaining = &remaining[start + end + 1..];
        } else {
            break;
        }
    }
    result
}

/// Parse an email date string in various common formats.
///
/// Supports RFC 5322, ISO 8601, and many broken real-world variants.
/// Returns `None` rather than an error when nothing matches.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = strip_trailing_comment(date_str.trim());
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // Remove leading day-of-week: "Thu, " or "Thu "
    let no_dow = strip_day_of_week(trimmed);

    // IMAP-style: "16-JUL-2025 03:01:03" → normalize to "16 Jul 2025 03:01:03"
    let no_dow_normalized = normalize_imap_date(&no_dow);

    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];

    for candidate in [&no_dow, &no_dow_normalized] {
        for fmt in &formats {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    // Replace named timezones with offsets and try again
    for candidate in [&no_dow, &no_dow_normalized] {
        let replaced = replace_named_tz(candidate);
        for fmt in &formats {
            if let Ok(dt) = DateTime::parse_from_str(&replaced, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Drop a trailing RFC 5322 comment such as `"(UTC)"` or `"(Pacific Standard Time)"`.
fn strip_trailing_comment(s: &str) -> &str {
    if s.ends_with(')') {
        if let Some(open) = s.rfind('(') {
            return s[..open].trim_end();
        }
    }
    s
}

/// Normalize IMAP-style dates: `"16-JUL-2025 03:01:03"` → `"16 Jul 2025 03:01:03"`.
///
/// IMAP INTERNALDATE and some mail servers use `DD-MMM-YYYY` with uppercase months
/// and hyphens instead of spaces. chrono's `%b` expects title-case months with spaces.
fn normalize_imap_date(s: &str) -> String {
    if !s.contains('-') {
        return s.to_string();
    }

    let months = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    let title_months = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    let mut result = s.to_string();

    for (i, month) in months.iter().enumerate() {
        let uc_pattern = format!("-{month}-");
        if result.contains(&uc_pattern) {
            result = result.replacen(&uc_pattern, &format!(" {} ", title_months[i]), 1);
            return result;
        }
        let lc_pattern = format!("-{}-", month.to_lowercase());
        if result.contains(&lc_pattern) {
            result = result.replacen(&lc_pattern, &format!(" {} ", title_months[i]), 1);
            return result;
        }
        let tc_pattern = format!("-{}-", title_months[i]);
        if result.contains(&tc_pattern) {
            result = result.replacen(&tc_pattern, &format!(" {} ", title_months[i]), 1);
            return result;
        }
    }

    result
}

/// Strip leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = [
        "Mon,", "Tue,", "Wed,", "Thu,", "Fri,", "Sat,", "Sun,", "Mon ", "Tue ", "Wed ", "Thu ",
        "Fri ", "Sat ", "Sun ",
    ];
    for day in &days {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim().to_string();
        }
    }
    s.to_string()
}

/// Replace well-known timezone abbreviations with numeric offsets.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("CEST", "+0200"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("UT", "+0000"),
        ("CET", "+0100"),
        ("JST", "+0900"),
    ];
    let mut result = s.to_string();
    for (name, offset) in &tzs {
        if result.ends_with(name) {
            let pos = result.len() - name.len();
            result.replace_range(pos.., offset);
            return result;
        }
    }
    result
}

//! Address-list parsing (RFC 5322 §3.4).
//!
//! Accepts `name <addr>`, bare `addr`, and groups `name: addr, addr;`.
//! Comments are stripped, quoted display names unquoted, and encoded words
//! in display names decoded. Entries that cannot be parsed are skipped and
//! reported; the rest of the list is still returned.

use crate::model::address::AddressEntry;
use crate::model::warning::DecodeWarning;
use crate::parser::header::decode_encoded_words_with;

/// Parse a comma-separated list of addresses, dropping malformed entries.
pub fn parse_address_list(raw: &str) -> Vec<AddressEntry> {
    let mut warnings = Vec::new();
    parse_address_list_with("address", raw, &mut warnings)
}

/// Parse an address list, recording one [`DecodeWarning::MalformedAddress`]
/// per skipped entry. `header` is only used to label warnings.
pub fn parse_address_list_with(
    header: &str,
    raw: &str,
    warnings: &mut Vec<DecodeWarning>,
) -> Vec<AddressEntry> {
    let cleaned = strip_comments(raw);
    let mut results = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut in_group = false;

    let mut finish = |current: &mut String, warnings: &mut Vec<DecodeWarning>| {
        let entry = current.trim();
        if !entry.is_empty() {
            match parse_mailbox(entry, warnings) {
                Some(addr) => results.push(addr),
                None => {
                    let warning = DecodeWarning::MalformedAddress {
                        header: header.to_string(),
                        entry: entry.to_string(),
                    };
                    warning.log();
                    warnings.push(warning);
                }
            }
        }
        current.clear();
    };

    let mut chars = cleaned.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' if !in_angle => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '<' if !in_quotes => {
                in_angle = true;
                current.push(ch);
            }
            '>' if !in_quotes => {
                in_angle = false;
                current.push(ch);
            }
            // The group's display name is not an address
            ':' if !in_quotes && !in_angle && !in_group => {
                in_group = true;
                current.clear();
            }
            ',' if !in_quotes && !in_angle => finish(&mut current, warnings),
            ';' if !in_quotes && !in_angle && in_group => {
                finish(&mut current, warnings);
                in_group = false;
            }
            _ => current.push(ch),
        }
    }
    finish(&mut current, warnings);

    results
}

/// Parse a single mailbox: `name <addr>`, `<addr>` or `addr`.
fn parse_mailbox(s: &str, warnings: &mut Vec<DecodeWarning>) -> Option<AddressEntry> {
    if let Some(open) = find_unquoted(s, '<') {
        let rest = &s[open + 1..];
        let inner = match rest.find('>') {
            Some(close) => &rest[..close],
            None => rest,
        };
        let address = normalize_angle_addr(inner)?;
        let name = decode_phrase(&s[..open], warnings);
        return Some(AddressEntry::new(address, name));
    }

    let bare = s.trim();
    if has_unquoted_whitespace(bare) || !is_addr_spec(bare) {
        return None;
    }
    Some(AddressEntry::new(bare, None))
}

/// Clean the contents of `<...>`: drop an obsolete source route
/// (`@a,@b:user@host`) and folding whitespace outside quotes.
fn normalize_angle_addr(inner: &str) -> Option<String> {
    let inner = inner.trim();
    let inner = if inner.starts_with('@') {
        inner.rsplit_once(':').map(|(_, addr)| addr)?
    } else {
        inner
    };

    let mut out = String::with_capacity(inner.len());
    let mut in_quotes = false;
    for ch in inner.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                out.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {}
            c => out.push(c),
        }
    }

    is_addr_spec(&out).then_some(out)
}

/// `local@domain` with both sides non-empty.
fn is_addr_spec(s: &str) -> bool {
    match s.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !s.contains(['<', '>', ',', ';'])
                && !domain.contains('"')
        }
        None => false,
    }
}

/// Turn a display-name phrase into plain text: unquote, unescape, collapse
/// whitespace, decode encoded words. Empty phrases become `None`.
fn decode_phrase(phrase: &str, warnings: &mut Vec<DecodeWarning>) -> Option<String> {
    let mut text = String::with_capacity(phrase.len());
    let mut in_quotes = false;
    let mut last_was_space = true;
    let mut chars = phrase.trim().chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    text.push(next);
                    last_was_space = false;
                }
            }
            c if c.is_whitespace() => {
                if !last_was_space {
                    text.push(' ');
                    last_was_space = true;
                }
            }
            c => {
                text.push(c);
                last_was_space = false;
            }
        }
    }

    let decoded = decode_encoded_words_with(text.trim(), warnings);
    let decoded = decoded.trim();
    (!decoded.is_empty()).then(|| decoded.to_string())
}

/// Remove `( ... )` comments (nestable, with `\` escapes) outside quoted strings.
fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if depth > 0 => {
                chars.next();
            }
            '\\' if in_quotes => {
                out.push(ch);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' if depth == 0 => {
                in_quotes = !in_quotes;
                out.push(ch);
            }
            '(' if !in_quotes => depth += 1,
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    out.push(' ');
                }
            }
            _ if depth > 0 => {}
            c => out.push(c),
        }
    }
    out
}

fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == target && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn has_unquoted_whitespace(s: &str) -> bool {
    let mut in_quotes = false;
    s.chars().any(|ch| {
        if ch == '"' {
            in_quotes = !in_quotes;
        }
        ch.is_whitespace() && !in_quotes
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(address: &str, name: Option<&str>) -> AddressEntry {
        AddressEntry::new(address, name.map(String::from))
    }

    #[test]
    fn test_parse_name_and_address() {
        assert_eq!(
            parse_address_list("John Doe <john@example.com>"),
            vec![entry("john@example.com", Some("John Doe"))]
        );
    }

    #[test]
    fn test_parse_bare_and_angle_address() {
        assert_eq!(
            parse_address_list("user@example.com, <other@example.com>"),
            vec![entry("user@example.com", None), entry("other@example.com", None)]
        );
    }

    #[test]
    fn test_parse_quoted_name_with_comma() {
        let list = parse_address_list("\"Last, First\" <a@b.com>, other@c.com");
        assert_eq!(
            list,
            vec![entry("a@b.com", Some("Last, First")), entry("other@c.com", None)]
        );
    }

    #[test]
    fn test_quoted_escapes() {
        let list = parse_address_list(r#""Jane \"JD\" Doe" <jd@example.com>"#);
        assert_eq!(list[0].name.as_deref(), Some("Jane \"JD\" Doe"));
    }

    #[test]
    fn test_comments_stripped() {
        let list = parse_address_list("Pete(A nice \\) chap) <pete(his account)@silly.test(his host)>");
        assert_eq!(list, vec![entry("pete@silly.test", Some("Pete"))]);

        let list = parse_address_list("jdoe@example.org (John Doe)");
        assert_eq!(list, vec![entry("jdoe@example.org", None)]);
    }

    #[test]
    fn test_group_syntax() {
        let list = parse_address_list(
            "A Group:Ed Jones <c@a.test>,joe@where.test,John <jdoe@one.test>;, after@x.test",
        );
        let addrs: Vec<&str> = list.iter().map(|a| a.address.as_str()).collect();
        assert_eq!(
            addrs,
            vec!["c@a.test", "joe@where.test", "jdoe@one.test", "after@x.test"]
        );
        assert_eq!(list[0].name.as_deref(), Some("Ed Jones"));
    }

    #[test]
    fn test_empty_group() {
        assert!(parse_address_list("undisclosed-recipients:;").is_empty());
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let mut warnings = Vec::new();
        let list = parse_address_list_with(
            "To",
            "ok@example.com, Broken Name, <no-at-sign>, also@example.com,",
            &mut warnings,
        );
        assert_eq!(
            list,
            vec![entry("ok@example.com", None), entry("also@example.com", None)]
        );
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            &warnings[0],
            DecodeWarning::MalformedAddress { header, entry } if header == "To" && entry == "Broken Name"
        ));
    }

    #[test]
    fn test_duplicates_preserved_in_order() {
        let list = parse_address_list("a@x.test, B <b@x.test>, A Again <a@x.test>");
        let addrs: Vec<&str> = list.iter().map(|a| a.address.as_str()).collect();
        assert_eq!(addrs, vec!["a@x.test", "b@x.test", "a@x.test"]);
    }

    #[test]
    fn test_encoded_display_name() {
        let list = parse_address_list("=?UTF-8?B?Sm9zw6kgR2FyY8OtYQ==?= <jose@example.com>");
        assert_eq!(list[0].name.as_deref(), Some("José García"));
        assert_eq!(list[0].address, "jose@example.com");
    }

    #[test]
    fn test_source_route_dropped() {
        let list = parse_address_list("<@relay1.test,@relay2.test:user@final.test>");
        assert_eq!(list, vec![entry("user@final.test", None)]);
    }

    #[test]
    fn test_quoted_local_part() {
        let list = parse_address_list("\"john doe\"@example.com");
        assert_eq!(list, vec![entry("\"john doe\"@example.com", None)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_address_list("").is_empty());
        assert!(parse_address_list("  ,  ").is_empty());
    }
}

//! Header section tokenizer: logical (unfolded) header lines and the
//! header/body boundary.

use crate::error::{MailError, Result};

/// The header section of a message or part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBlock<'a> {
    /// Logical header lines with folding removed and line endings stripped.
    pub lines: Vec<Vec<u8>>,
    /// Offset of the first body byte (just after the blank line), or the end
    /// of input when the section was not terminated.
    pub body_offset: usize,
    /// `false` when end-of-input was reached without a blank line.
    pub terminated: bool,
    /// The full input, so callers can slice the body.
    data: &'a [u8],
}

impl<'a> HeaderBlock<'a> {
    pub fn body(&self) -> &'a [u8] {
        &self.data[self.body_offset..]
    }
}

/// Read the header section of `data` starting at `start`.
///
/// Lines beginning with a space or tab continue the previous line (RFC 5322
/// §2.2.3); the line break is removed and the whitespace kept. Accepts both
/// `\r\n` and bare `\n`. A continuation line with nothing to continue is
/// dropped.
///
/// When no blank line is found, `strict` turns this into
/// [`MailError::MalformedHeader`]; otherwise the whole remainder is headers
/// and the body is empty.
pub fn read_header_block(data: &[u8], start: usize, strict: bool) -> Result<HeaderBlock<'_>> {
    let mut lines: Vec<Vec<u8>> = Vec::new();
    let mut pos = start.min(data.len());

    while pos < data.len() {
        let (line, next) = next_line(data, pos);
        if line.is_empty() {
            return Ok(HeaderBlock {
                lines,
                body_offset: next,
                terminated: true,
                data,
            });
        }
        if line[0] == b' ' || line[0] == b'\t' {
            if let Some(last) = lines.last_mut() {
                last.extend_from_slice(line);
            }
        } else {
            lines.push(line.to_vec());
        }
        pos = next;
    }

    if strict {
        return Err(MailError::MalformedHeader { offset: start });
    }
    Ok(HeaderBlock {
        lines,
        body_offset: data.len(),
        terminated: false,
        data,
    })
}

/// Split a logical header line into `(name, value)`.
///
/// The name is trimmed; the value has surrounding whitespace removed.
/// Returns `None` for lines without a colon or with an empty name.
pub fn split_field(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let colon = line.iter().position(|&b| b == b':')?;
    let name = line[..colon].trim_ascii();
    if name.is_empty() || name.iter().any(|b| b.is_ascii_whitespace()) {
        return None;
    }
    Some((name, line[colon + 1..].trim_ascii()))
}

/// Skip a UTF-8 BOM and a leading mbox `From ` separator line.
pub fn skip_preamble(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&b"\xEF\xBB\xBF"[..]).unwrap_or(data);
    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

/// Return the line starting at `pos` without its terminator, and the offset
/// of the following line.
pub(crate) fn next_line(data: &[u8], pos: usize) -> (&[u8], usize) {
    match data[pos..].iter().position(|&b| b == b'\n') {
        Some(nl) => {
            let end = pos + nl;
            let line = &data[pos..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            (line, end + 1)
        }
        None => {
            let line = &data[pos..];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            (line, data.len())
        }
    }
}

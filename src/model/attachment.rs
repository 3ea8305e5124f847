//! Attachment descriptors, derived on demand from leaf parts.

use super::message::Part;

/// A view of one attachment inside a parsed message.
///
/// Nothing here is stored in the tree: the descriptor borrows the decoded
/// content of the [`Part`] it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor<'a> {
    /// Filename from `Content-Disposition` (preferred) or the `Content-Type`
    /// `name` parameter. `None` when neither header supplies one.
    pub filename: Option<&'a str>,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    pub mime_type: String,

    /// Decoded content. Text attachments are returned as UTF-8.
    pub content: &'a [u8],

    /// Declared Content-Transfer-Encoding, lowercased (`"7bit"` when absent).
    pub transfer_encoding: String,

    /// Content-ID without angle brackets, for parts referenced from HTML.
    pub content_id: Option<String>,

    /// `true` if the disposition is `inline` (embedded in HTML).
    pub is_inline: bool,

    /// The part the descriptor was derived from.
    pub part: &'a Part,
}

impl<'a> AttachmentDescriptor<'a> {
    /// Derive a descriptor from a leaf part. Returns `None` for containers.
    pub fn from_part(part: &'a Part) -> Option<Self> {
        let content = part.content()?;
        Some(Self {
            filename: part.filename(),
            mime_type: part.content_type().mime_type(),
            content: content.as_bytes(),
            transfer_encoding: part.transfer_encoding(),
            content_id: part.content_id(),
            is_inline: part.disposition().is_some_and(|d| d.is_inline()),
            part,
        })
    }

    /// Decoded size in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Filename, or a generated `attachment_<index>` placeholder.
    pub fn filename_or(&self, index: usize) -> String {
        self.filename
            .map(String::from)
            .unwrap_or_else(|| format!("attachment_{index}"))
    }
}

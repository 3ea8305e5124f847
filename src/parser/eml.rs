//! Parser for individual `.eml` files (RFC 5322 messages on disk).

use std::path::Path;

use crate::config::ParserConfig;
use crate::error::{MailError, Result};
use crate::model::message::Message;

/// Read a single `.eml` file and parse it into a [`Message`].
///
/// A leading mbox `From ` line is tolerated, so single-message mbox
/// exports parse too.
pub fn parse_eml(path: impl AsRef<Path>, config: &ParserConfig) -> Result<Message> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MailError::FileNotFound(path.to_path_buf())
        } else {
            MailError::io(path, e)
        }
    })?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "Read EML file");
    Message::parse(&data, config)
}

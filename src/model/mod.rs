//! Core data model types: the part tree, header fields, addresses, and attachments.

pub mod address;
pub mod attachment;
pub mod content_type;
pub mod header;
pub mod message;
pub mod warning;

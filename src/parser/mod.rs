//! Email parsing: header tokenizer, header and address decoding, content
//! parameters, transfer decoding, and MIME tree construction.

pub mod address;
pub mod charset;
pub mod eml;
pub mod header;
pub mod mime;
pub mod params;
pub mod tokenizer;
pub mod transfer;

//! # mimewalk
//!
//! MIME tree traversal for email with composable visitors.
//!
//! ## Features
//!
//! - **Tree walker**: Recursive descent over nested `multipart/*` containers
//!   with enter and boundary events
//! - **Visitor chains**: Printer, plain-text, body and attachment collectors
//!   that wrap each other as decorators
//! - **Alternative selection**: Flattened view resolving `multipart/alternative`
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 headers, RFC 2231
//!   parameters, WHATWG charsets plus UTF-7
//!
//! ## Quick Start
//!
//! ### Extracting Text
//!
//! ```ignore
//! use mimewalk::extract_plain_text;
//!
//! let raw = b"Content-Type: text/plain; charset=utf-8\r\n\r\nHello, World!";
//! let report = extract_plain_text(raw)?;
//! println!("{}", report.plain_text);
//! ```
//!
//! ### Body and Attachments
//!
//! ```ignore
//! use mimewalk::extract_parts;
//!
//! let extraction = extract_parts(&std::fs::read("message.eml")?)?;
//! println!("{} ({})", extraction.body, extraction.body_media_type);
//! for attachment in &extraction.attachments {
//!     println!("{:?}: {} bytes", attachment.filename(), attachment.size());
//! }
//! ```
//!
//! ### Custom Visitors
//!
//! ```ignore
//! use mimewalk::visitor::{MimePrinter, PlainTextCollector};
//! use mimewalk::{Config, Message, walk_message};
//!
//! let message = Message::parse(raw);
//! let config = Config::builder().fallback_charset("windows-1252").build();
//! let mut chain = PlainTextCollector::with_config(MimePrinter::new(), config.clone());
//! walk_message(&message, &mut chain, &config)?;
//!
//! println!("{}", chain.inner().transcript());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod alternative;
mod config;
mod content_type;
mod decoder;
mod error;
mod header;
mod message;
mod multipart;
mod pipeline;
mod walker;

pub mod charset;
pub mod encoding;
pub mod visitor;

pub use address::fold_address_comments;
pub use alternative::{flatten, flatten_with_config, select_preferred};
pub use charset::{decode_charset, resolve_charset};
pub use config::{Config, ConfigBuilder, DEFAULT_MAX_DEPTH};
pub use content_type::{ContentDisposition, ContentType};
pub use decoder::{decode_text, decode_text_with};
pub use encoding::{TransferEncoding, decode_header, decode_transfer_encoding, try_decode_header};
pub use error::{Error, Result};
pub use header::{Headers, canonical_name};
pub use message::{Message, Part, content_type_of, disposition_of, is_leaf, split_header_body};
pub use multipart::split_parts;
pub use pipeline::{
    Extraction, PlainTextReport, extract_parts, extract_parts_with, extract_plain_text,
    extract_plain_text_with,
};
pub use walker::{NullVisitor, Visitor, Walker, walk, walk_message, walk_with_config};

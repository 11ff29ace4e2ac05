//! Concrete visitors.
//!
//! Each decorator owns the visitor it wraps and forwards every event to it
//! unchanged, so chains are composed by construction:
//!
//! ```
//! use mimewalk::visitor::{AttachmentsCollector, BodyCollector, MimePrinter};
//!
//! let chain = AttachmentsCollector::new(BodyCollector::new(MimePrinter::new()));
//! assert!(chain.attachments().is_empty());
//! ```

mod attachments;
mod body;
mod plain_text;
mod printer;

pub use attachments::{Attachment, AttachmentsCollector};
pub use body::{BodyCollector, BodySegment, plain_to_html, requires_html_conversion};
pub use plain_text::PlainTextCollector;
pub use printer::MimePrinter;

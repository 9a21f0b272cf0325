//! Tagged binary serialization format (TBSF).
//!
//! A document is a flat sequence of records. Each record is a one byte
//! [`Tag`] followed by a payload whose size the tag determines: scalars
//! and fixed-width vectors, length-prefixed strings and blobs, and begin/end
//! records delimiting lists and objects. All numbers are little-endian.
//!
//! Readers decode zero-copy from a byte slice and report every value in its
//! canonical family (all integers as [`Tag::I64`], all floats as
//! [`Tag::F64`], every string length as [`Tag::STRING`]), so schemas can
//! evolve their widths without breaking older readers.
//!
//! ## Recovery
//!
//! Objects and lists can be opened with a *recovery marker*, a short text
//! repeated in the matching end record. When an iterator finds damaged
//! records or an end record that does not belong to its aggregate, it
//! searches the remaining bytes for that exact end record and resumes
//! after it, so one corrupted entry does not take the rest of the document
//! down with it.
//!
//! ```
//! use skein::tbsf::{Reader, Writer};
//!
//! # fn main() -> Result<(), skein::tbsf::EncodeError> {
//! let mut writer = Writer::new(Vec::new());
//! writer.begin_list()?;
//! for id in [1, 2] {
//!     writer.begin_recovery_object("Entry:Magic")?;
//!     writer.string("id")?;
//!     writer.u32(id)?;
//!     writer.string("name")?;
//!     writer.string("entry")?;
//!     writer.end_recovery_object("Entry:Magic")?;
//! }
//! writer.end_list()?;
//! let mut bytes = writer.into_inner();
//!
//! // scribble over the first entry's "name" key
//! let at = bytes.windows(4).position(|w| w == b"name").unwrap_or(0);
//! bytes[at - 2..at + 4].fill(0xFF);
//!
//! let mut reader = Reader::new(&bytes);
//! let list = reader.value();
//! let mut ids = Vec::new();
//! while let Some(entry) = reader.iterate_list(&list) {
//!     while let Some((key, value)) = reader.iterate_object(&entry) {
//!         if key.str_eq("id") {
//!             ids.push(value.as_i64().unwrap_or(-1));
//!         }
//!     }
//! }
//!
//! assert_eq!(ids, [1, 2]);
//! assert_eq!(reader.recovery_count(), 1);
//! # Ok(())
//! # }
//! ```

mod deser;
mod error;
mod reader;
mod sink;
mod tag;
mod value;
mod writer;

pub use deser::Deserialize;
pub use error::{DecodeError, Diagnostic, DiagnosticKind, EncodeError};
pub use reader::{ListItems, ObjectEntries, Reader};
pub use sink::{ByteSink, IoSink};
pub use tag::Tag;
pub use value::{Payload, Value};
pub use writer::Writer;

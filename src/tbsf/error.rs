use std::io;

use thiserror::Error;

use super::Tag;

/// Errors raised while writing records.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The underlying sink failed
    #[error("sink write failed: {0}")]
    Io(#[from] io::Error),

    /// Recovery marker text longer than a one byte length can describe
    #[error("recovery marker is {len} bytes, at most 255 are allowed")]
    TagTooLong {
        /// Length of the rejected marker text
        len: usize,
    },
}

/// Why a record could not be decoded.
///
/// Every variant records the offset of the record's tag byte, which is
/// also where the reader is left after the failure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// No bytes left where a record should start
    #[error("end of input at offset {offset}")]
    Eof {
        /// Offset of the missing tag byte
        offset: usize,
    },

    /// Tag byte that names no record type, or the reserved ERROR tag
    #[error("unknown tag byte {tag:#04x} at offset {offset}")]
    UnknownTag {
        /// The offending byte
        tag: u8,
        /// Offset of the tag byte
        offset: usize,
    },

    /// Payload or length prefix runs past the end of input
    #[error("truncated {tag} record at offset {offset}")]
    Truncated {
        /// Tag of the cut-off record
        tag: Tag,
        /// Offset of the tag byte
        offset: usize,
    },

    /// Trailing NUL expected after string or marker text is absent
    #[error("{tag} record at offset {offset} is missing its NUL terminator")]
    MissingNul {
        /// Tag of the record
        tag: Tag,
        /// Offset of the tag byte
        offset: usize,
    },

    /// BOOL payload other than 0 or 1
    #[error("bool record at offset {offset} holds {byte:#04x}")]
    InvalidBool {
        /// The payload byte
        byte: u8,
        /// Offset of the tag byte
        offset: usize,
    },
}

impl DecodeError {
    /// Offset of the record that failed to decode.
    pub const fn offset(&self) -> usize {
        match *self {
            Self::Eof { offset }
            | Self::UnknownTag { offset, .. }
            | Self::Truncated { offset, .. }
            | Self::MissingNul { offset, .. }
            | Self::InvalidBool { offset, .. } => offset,
        }
    }
}

/// Problem reported to a reader's error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A record failed to decode
    Decode(DecodeError),
    /// An iterator searched for a missing end record and did not find it
    RecoveryMiss {
        /// Tag of the end record that was searched for
        end: Tag,
    },
}

/// Context handed to the error sink alongside each problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    /// Reader depth when the problem was seen
    pub depth: usize,
    /// Reader offset when the problem was seen
    pub offset: usize,
    /// What went wrong
    pub kind: DiagnosticKind,
}

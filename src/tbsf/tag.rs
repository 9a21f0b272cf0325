use std::fmt;

/// Type tag: the first byte of every record.
///
/// The discriminants are the bytes on the wire and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tag {
    /// No payload.
    Null = 0,
    /// Opens a list.
    ListBegin = 1,
    /// Opens an object of alternating keys and values.
    ObjectBegin = 2,
    /// Opens an object carrying a recovery marker.
    RecoveryObjectBegin = 3,
    /// Opens a list carrying a recovery marker.
    RecoveryListBegin = 4,
    /// Closes a list.
    ListEnd = 5,
    /// Closes an object.
    ObjectEnd = 6,
    /// Closes a recovery list; repeats the marker of its begin.
    RecoveryListEnd = 7,
    /// Closes a recovery object; repeats the marker of its begin.
    RecoveryObjectEnd = 8,
    /// Reported for malformed input. Never written.
    Error = 9,
    /// Empty string.
    String0 = 10,
    /// String with a one byte length.
    String8 = 11,
    /// String with an eight byte length.
    String64 = 12,
    /// Empty binary blob.
    Binary0 = 13,
    /// Binary blob with a one byte length.
    Binary8 = 14,
    /// Binary blob with an eight byte length.
    Binary64 = 15,
    /// One byte, 0 or 1.
    Bool = 16,
    /// Unsigned 8 bit integer.
    U8 = 17,
    /// Unsigned 16 bit integer.
    U16 = 18,
    /// Unsigned 32 bit integer.
    U32 = 19,
    /// Unsigned 64 bit integer.
    U64 = 20,
    /// Signed 8 bit integer.
    I8 = 21,
    /// Signed 16 bit integer.
    I16 = 22,
    /// Signed 32 bit integer.
    I32 = 23,
    /// Signed 64 bit integer.
    I64 = 24,
    /// One byte float slot, carried as an unsigned byte.
    F8 = 25,
    /// Two byte float slot, carried as an unsigned 16 bit integer.
    F16 = 26,
    /// IEEE single precision float.
    F32 = 27,
    /// IEEE double precision float.
    F64 = 28,
    /// Two `f32` components.
    F32V2 = 29,
    /// Three `f32` components.
    F32V3 = 30,
    /// Four `f32` components.
    F32V4 = 31,
    /// Two `i32` components.
    I32V2 = 32,
    /// Three `i32` components.
    I32V3 = 33,
    /// Four `i32` components.
    I32V4 = 34,
}

impl Tag {
    /// Canonical family of all strings.
    pub const STRING: Self = Self::String64;
    /// Canonical family of all binary blobs.
    pub const BINARY: Self = Self::Binary64;
    /// Canonical family of all integers.
    pub const INTEGER: Self = Self::I64;
    /// Canonical family of all floats.
    pub const FLOAT: Self = Self::F64;
    /// A list value.
    pub const LIST: Self = Self::ListBegin;
    /// An object value.
    pub const OBJECT: Self = Self::ObjectBegin;
    /// A recovery list value.
    pub const RECOVERY_LIST: Self = Self::RecoveryListBegin;
    /// A recovery object value.
    pub const RECOVERY_OBJECT: Self = Self::RecoveryObjectBegin;

    const ALL: [Self; 35] = [
        Self::Null,
        Self::ListBegin,
        Self::ObjectBegin,
        Self::RecoveryObjectBegin,
        Self::RecoveryListBegin,
        Self::ListEnd,
        Self::ObjectEnd,
        Self::RecoveryListEnd,
        Self::RecoveryObjectEnd,
        Self::Error,
        Self::String0,
        Self::String8,
        Self::String64,
        Self::Binary0,
        Self::Binary8,
        Self::Binary64,
        Self::Bool,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::F8,
        Self::F16,
        Self::F32,
        Self::F64,
        Self::F32V2,
        Self::F32V3,
        Self::F32V4,
        Self::I32V2,
        Self::I32V3,
        Self::I32V4,
    ];

    /// Wire byte of this tag.
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Family this tag is reported as once read: integer widths collapse to
    /// [`Tag::I64`], float widths to [`Tag::F64`] and the length variants
    /// of strings and blobs to [`Tag::STRING`] and [`Tag::BINARY`].
    pub const fn canonical(self) -> Self {
        match self {
            Self::U8
            | Self::U16
            | Self::U32
            | Self::U64
            | Self::I8
            | Self::I16
            | Self::I32
            | Self::I64 => Self::I64,
            Self::F8 | Self::F16 | Self::F32 | Self::F64 => Self::F64,
            Self::String0 | Self::String8 | Self::String64 => Self::STRING,
            Self::Binary0 | Self::Binary8 | Self::Binary64 => Self::BINARY,
            other => other,
        }
    }

    /// Payload size of fixed-size records, `None` for the variable ones.
    pub const fn fixed_payload_size(self) -> Option<usize> {
        match self {
            Self::Null
            | Self::ListBegin
            | Self::ObjectBegin
            | Self::ListEnd
            | Self::ObjectEnd
            | Self::String0
            | Self::Binary0 => Some(0),
            Self::Bool | Self::U8 | Self::I8 | Self::F8 => Some(1),
            Self::U16 | Self::I16 | Self::F16 => Some(2),
            Self::U32 | Self::I32 | Self::F32 => Some(4),
            Self::U64 | Self::I64 | Self::F64 | Self::F32V2 | Self::I32V2 => Some(8),
            Self::F32V3 | Self::I32V3 => Some(12),
            Self::F32V4 | Self::I32V4 => Some(16),
            _ => None,
        }
    }

    /// Integers and floats of any width.
    pub const fn is_numeric(self) -> bool {
        matches!(self as u8, 17..=28)
    }

    /// Integers of any width and signedness.
    pub const fn is_integer(self) -> bool {
        matches!(self as u8, 17..=24)
    }

    /// `I8` to `I64`.
    pub const fn is_signed_integer(self) -> bool {
        matches!(self as u8, 21..=24)
    }

    /// `U8` to `U64`.
    pub const fn is_unsigned_integer(self) -> bool {
        matches!(self as u8, 17..=20)
    }

    /// `F8` to `F64`.
    pub const fn is_float(self) -> bool {
        matches!(self as u8, 25..=28)
    }

    /// Fixed-width `f32` or `i32` vectors.
    pub const fn is_vector(self) -> bool {
        matches!(self as u8, 29..=34)
    }

    /// Opens a list or an object, with or without a marker.
    pub const fn is_begin(self) -> bool {
        matches!(self as u8, 1..=4)
    }

    /// Closes a list or an object, with or without a marker.
    pub const fn is_end(self) -> bool {
        matches!(self as u8, 5..=8)
    }

    /// A closing tag or [`Tag::Error`]; either one stops an iteration.
    pub const fn is_end_or_error(self) -> bool {
        matches!(self as u8, 5..=9)
    }

    /// Begin or end carrying a recovery marker.
    pub const fn is_recovery(self) -> bool {
        matches!(
            self,
            Self::RecoveryObjectBegin
                | Self::RecoveryListBegin
                | Self::RecoveryListEnd
                | Self::RecoveryObjectEnd
        )
    }

    /// Lists, with or without a marker.
    pub const fn is_list(self) -> bool {
        matches!(self, Self::ListBegin | Self::RecoveryListBegin)
    }

    /// Objects, with or without a marker.
    pub const fn is_object(self) -> bool {
        matches!(self, Self::ObjectBegin | Self::RecoveryObjectBegin)
    }

    /// The closing tag that matches an opening one.
    pub const fn matching_end(self) -> Option<Self> {
        match self {
            Self::ListBegin => Some(Self::ListEnd),
            Self::ObjectBegin => Some(Self::ObjectEnd),
            Self::RecoveryListBegin => Some(Self::RecoveryListEnd),
            Self::RecoveryObjectBegin => Some(Self::RecoveryObjectEnd),
            _ => None,
        }
    }

    /// Number of components of a vector tag.
    pub const fn vector_len(self) -> Option<usize> {
        match self {
            Self::F32V2 | Self::I32V2 => Some(2),
            Self::F32V3 | Self::I32V3 => Some(3),
            Self::F32V4 | Self::I32V4 => Some(4),
            _ => None,
        }
    }

    /// Upper-case name, as used in format documentation.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::ListBegin => "LIST_BEGIN",
            Self::ObjectBegin => "OBJECT_BEGIN",
            Self::RecoveryObjectBegin => "RECOVERY_OBJECT_BEGIN",
            Self::RecoveryListBegin => "RECOVERY_LIST_BEGIN",
            Self::ListEnd => "LIST_END",
            Self::ObjectEnd => "OBJECT_END",
            Self::RecoveryListEnd => "RECOVERY_LIST_END",
            Self::RecoveryObjectEnd => "RECOVERY_OBJECT_END",
            Self::Error => "ERROR",
            Self::String0 => "STRING_0",
            Self::String8 => "STRING_8",
            Self::String64 => "STRING_64",
            Self::Binary0 => "BINARY_0",
            Self::Binary8 => "BINARY_8",
            Self::Binary64 => "BINARY_64",
            Self::Bool => "BOOL",
            Self::U8 => "U8",
            Self::U16 => "U16",
            Self::U32 => "U32",
            Self::U64 => "U64",
            Self::I8 => "I8",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::F8 => "F8",
            Self::F16 => "F16",
            Self::F32 => "F32",
            Self::F64 => "F64",
            Self::F32V2 => "F32V2",
            Self::F32V3 => "F32V3",
            Self::F32V4 => "F32V4",
            Self::I32V2 => "I32V2",
            Self::I32V3 => "I32V3",
            Self::I32V4 => "I32V4",
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = u8;

    /// Fails with the byte itself when it names no tag.
    fn try_from(byte: u8) -> Result<Self, u8> {
        Self::ALL.get(usize::from(byte)).copied().ok_or(byte)
    }
}

impl From<Tag> for u8 {
    fn from(tag: Tag) -> Self {
        tag.byte()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use super::{DecodeError, Tag};

/// Decoded payload of a record.
///
/// Integers of every width are widened to `i64`. Unsigned 64 bit values
/// keep their bit pattern, so read them back through [`Value::as_u64`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    /// Records without a payload: NULL, plain begins and ends
    None,
    /// BOOL
    Bool(bool),
    /// Any integer width
    Int(i64),
    /// Any float width
    Float(f64),
    /// String or binary contents, or the text of a recovery marker,
    /// borrowed from the input
    Bytes(&'a [u8]),
    /// `f32` vector components; only the first `len` are meaningful
    F32s([f32; 4]),
    /// `i32` vector components; only the first `len` are meaningful
    I32s([i32; 4]),
    /// Why decoding failed
    Error(DecodeError),
}

/// One decoded record.
///
/// Values borrow strings and blobs from the reader's input instead of
/// copying them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value<'a> {
    tag: Tag,
    depth: usize,
    offset: usize,
    payload: Payload<'a>,
}

impl<'a> Value<'a> {
    pub(super) const fn new(tag: Tag, depth: usize, offset: usize, payload: Payload<'a>) -> Self {
        Self {
            tag,
            depth,
            offset,
            payload,
        }
    }

    pub(super) const fn failed(err: DecodeError, depth: usize) -> Self {
        Self {
            tag: Tag::Error,
            depth,
            offset: err.offset(),
            payload: Payload::Error(err),
        }
    }

    /// Canonical family: [`Tag::I64`] for every integer, [`Tag::F64`] for
    /// every float, [`Tag::STRING`] and [`Tag::BINARY`] for every length
    /// encoding. Other tags are reported as read.
    #[inline]
    pub const fn tag(&self) -> Tag {
        self.tag.canonical()
    }

    /// Tag byte exactly as found in the input.
    #[inline]
    pub const fn exact_tag(&self) -> Tag {
        self.tag
    }

    /// Reader depth before this record was read. For a begin record this is
    /// the depth outside the aggregate.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Offset of the record's tag byte in the input.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// The decoded payload.
    #[inline]
    pub const fn payload(&self) -> &Payload<'a> {
        &self.payload
    }

    /// `true` for the value returned on malformed input.
    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Error(_))
    }

    /// `true` for NULL records.
    pub const fn is_null(&self) -> bool {
        matches!(self.tag, Tag::Null)
    }

    /// Why decoding failed, for error values.
    pub const fn error(&self) -> Option<DecodeError> {
        match self.payload {
            Payload::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Integer payload widened to `i64`.
    ///
    /// A U64 above `i64::MAX` comes back wrapped; use
    /// [`as_u64`](Self::as_u64) for those.
    pub const fn as_i64(&self) -> Option<i64> {
        match self.payload {
            Payload::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Integer payload as `u64`. Negative signed integers yield `None`.
    pub const fn as_u64(&self) -> Option<u64> {
        match self.payload {
            Payload::Int(v) if self.tag.is_unsigned_integer() => Some(v.cast_unsigned()),
            Payload::Int(v) if v >= 0 => Some(v.cast_unsigned()),
            _ => None,
        }
    }

    /// Float payload widened to `f64`.
    pub const fn as_f64(&self) -> Option<f64> {
        match self.payload {
            Payload::Float(v) => Some(v),
            _ => None,
        }
    }

    /// BOOL payload.
    pub const fn as_bool(&self) -> Option<bool> {
        match self.payload {
            Payload::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// String payload, without the trailing NUL, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        self.as_string_bytes()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// String payload as raw bytes, without the trailing NUL.
    pub fn as_string_bytes(&self) -> Option<&'a [u8]> {
        match self.payload {
            Payload::Bytes(bytes) if self.tag() == Tag::STRING => Some(bytes),
            _ => None,
        }
    }

    /// Binary payload.
    pub fn as_binary(&self) -> Option<&'a [u8]> {
        match self.payload {
            Payload::Bytes(bytes) if self.tag() == Tag::BINARY => Some(bytes),
            _ => None,
        }
    }

    /// Marker text of a recovery begin or end record.
    pub const fn marker(&self) -> Option<&'a [u8]> {
        match self.payload {
            Payload::Bytes(bytes) if self.tag.is_recovery() => Some(bytes),
            _ => None,
        }
    }

    /// Components of an F32V2, F32V3 or F32V4 record.
    pub fn as_f32s(&self) -> Option<&[f32]> {
        match (&self.payload, self.tag.vector_len()) {
            (Payload::F32s(components), Some(len)) => Some(&components[..len]),
            _ => None,
        }
    }

    /// Components of an I32V2, I32V3 or I32V4 record.
    pub fn as_i32s(&self) -> Option<&[i32]> {
        match (&self.payload, self.tag.vector_len()) {
            (Payload::I32s(components), Some(len)) => Some(&components[..len]),
            _ => None,
        }
    }

    /// `true` if this is a string record holding exactly `text`.
    pub fn str_eq(&self, text: &str) -> bool {
        self.as_string_bytes() == Some(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_follow_the_payload() {
        let int = Value::new(Tag::I16, 0, 0, Payload::Int(-4));
        assert_eq!(int.tag(), Tag::I64);
        assert_eq!(int.exact_tag(), Tag::I16);
        assert_eq!(int.as_i64(), Some(-4));
        assert_eq!(int.as_u64(), None);
        assert_eq!(int.as_f64(), None);

        let big = Value::new(Tag::U64, 0, 0, Payload::Int(-1));
        assert_eq!(big.as_u64(), Some(u64::MAX));

        let text = Value::new(Tag::String8, 1, 4, Payload::Bytes(b"hi"));
        assert_eq!(text.as_str(), Some("hi"));
        assert!(text.str_eq("hi"));
        assert!(!text.str_eq("h"));
        assert_eq!(text.as_binary(), None);
        assert_eq!(text.depth(), 1);
        assert_eq!(text.offset(), 4);

        let blob = Value::new(Tag::Binary0, 0, 0, Payload::Bytes(&[]));
        assert_eq!(blob.as_binary(), Some(&[][..]));
        assert!(!blob.str_eq(""));
    }

    #[test]
    fn vectors_expose_their_width() {
        let v = Value::new(Tag::F32V3, 0, 0, Payload::F32s([1.0, 2.0, 3.0, 0.0]));
        assert_eq!(v.as_f32s(), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(v.as_i32s(), None);

        let v = Value::new(Tag::I32V2, 0, 0, Payload::I32s([5, 6, 0, 0]));
        assert_eq!(v.as_i32s(), Some(&[5, 6][..]));
    }

    #[test]
    fn markers_only_on_recovery_records() {
        let begin = Value::new(Tag::RecoveryListBegin, 0, 0, Payload::Bytes(b"M"));
        assert_eq!(begin.marker(), Some(&b"M"[..]));
        assert_eq!(begin.as_string_bytes(), None);

        let text = Value::new(Tag::String8, 0, 0, Payload::Bytes(b"M"));
        assert_eq!(text.marker(), None);
    }

    #[test]
    fn error_values() {
        let err = DecodeError::Eof { offset: 9 };
        let v = Value::failed(err, 2);
        assert!(v.is_error());
        assert_eq!(v.tag(), Tag::Error);
        assert_eq!(v.offset(), 9);
        assert_eq!(v.depth(), 2);
        assert_eq!(v.error(), Some(err));
    }
}

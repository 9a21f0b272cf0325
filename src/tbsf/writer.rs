use tracing::debug;

use super::{ByteSink, EncodeError, Tag};
use crate::scan::{MAX_MARKER_LEN, ScratchBuf};

/// Largest fixed-size record: tag byte plus a four component vector.
const MAX_FIXED_RECORD: usize = 1 + 16;

/// Tag byte plus an eight byte length prefix.
const MAX_LENGTH_HEADER: usize = 1 + 8;

/// Encode a recovery begin or end record: tag, length, text and NUL.
///
/// Returns `None` when `text` is longer than 255 bytes.
pub(super) fn marker_record(tag: Tag, text: &[u8]) -> Option<ScratchBuf<MAX_MARKER_LEN>> {
    let len = u8::try_from(text.len()).ok()?;
    let mut buf = ScratchBuf::new();
    buf.push(tag.byte());
    buf.push(len);
    buf.extend_from_slice(text);
    buf.push(0);
    Some(buf)
}

/// Streaming TBSF encoder.
///
/// Each method appends exactly one record to the sink. The writer tracks
/// nesting depth for debugging but does not check that begins and ends
/// pair up; readers deal with that.
///
/// # Examples
///
/// ```
/// use skein::tbsf::Writer;
///
/// # fn main() -> Result<(), skein::tbsf::EncodeError> {
/// let mut writer = Writer::new(Vec::new());
/// writer.begin_object()?;
/// writer.string("k")?;
/// writer.i32(7)?;
/// writer.end_object()?;
///
/// assert_eq!(writer.depth(), 0);
/// assert_eq!(writer.into_inner(), [2, 11, 1, b'k', 0, 23, 7, 0, 0, 0, 6]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Writer<S> {
    sink: S,
    depth: usize,
}

macro_rules! scalar_writers {
    ($($(#[$doc:meta])* $name:ident: $ty:ty => $tag:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: $ty) -> Result<(), EncodeError> {
                self.fixed(Tag::$tag, &value.to_le_bytes())
            }
        )*
    };
}

macro_rules! vector_writers {
    ($($(#[$doc:meta])* $name:ident: [$ty:ty; $n:literal] => $tag:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, value: [$ty; $n]) -> Result<(), EncodeError> {
                let mut buf = ScratchBuf::<MAX_FIXED_RECORD>::new();
                buf.push(Tag::$tag.byte());
                for component in value {
                    buf.extend_from_slice(&component.to_le_bytes());
                }
                self.sink.write_bytes(&buf)
            }
        )*
    };
}

impl<S: ByteSink> Writer<S> {
    /// Create a writer appending to `sink`.
    pub const fn new(sink: S) -> Self {
        Self { sink, depth: 0 }
    }

    /// Number of aggregates opened and not yet closed.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Borrow the sink.
    pub const fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the sink.
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give back the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn fixed(&mut self, tag: Tag, payload: &[u8]) -> Result<(), EncodeError> {
        debug_assert_eq!(tag.fixed_payload_size(), Some(payload.len()));
        let mut buf = ScratchBuf::<MAX_FIXED_RECORD>::new();
        buf.push(tag.byte());
        buf.extend_from_slice(payload);
        self.sink.write_bytes(&buf)
    }

    fn open(&mut self, tag: Tag) -> Result<(), EncodeError> {
        self.sink.write_bytes(&[tag.byte()])?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, tag: Tag) -> Result<(), EncodeError> {
        self.sink.write_bytes(&[tag.byte()])?;
        self.leave();
        Ok(())
    }

    fn leave(&mut self) {
        if self.depth == 0 {
            debug!("end record written outside any aggregate");
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn marker(&mut self, tag: Tag, text: &str) -> Result<(), EncodeError> {
        let record = marker_record(tag, text.as_bytes())
            .ok_or(EncodeError::TagTooLong { len: text.len() })?;
        self.sink.write_bytes(&record)
    }

    /// Length-prefixed payload using the narrowest of the three encodings.
    fn sized(&mut self, tags: [Tag; 3], payload: &[u8], nul: bool) -> Result<(), EncodeError> {
        let [empty, short, long] = tags;
        let mut header = ScratchBuf::<MAX_LENGTH_HEADER>::new();
        match u8::try_from(payload.len()) {
            Ok(0) => return self.sink.write_bytes(&[empty.byte()]),
            Ok(len) => {
                header.push(short.byte());
                header.push(len);
            },
            Err(_) => {
                header.push(long.byte());
                header.extend_from_slice(&(payload.len() as u64).to_le_bytes());
            },
        }

        self.sink.write_bytes(&header)?;
        self.sink.write_bytes(payload)?;
        if nul {
            self.sink.write_bytes(&[0])?;
        }
        Ok(())
    }

    /// Write a NULL record.
    pub fn null(&mut self) -> Result<(), EncodeError> {
        self.sink.write_bytes(&[Tag::Null.byte()])
    }

    /// Write a BOOL record.
    pub fn bool(&mut self, value: bool) -> Result<(), EncodeError> {
        self.fixed(Tag::Bool, &[u8::from(value)])
    }

    scalar_writers! {
        /// Write a U8 record.
        u8: u8 => U8;
        /// Write a U16 record.
        u16: u16 => U16;
        /// Write a U32 record.
        u32: u32 => U32;
        /// Write a U64 record.
        u64: u64 => U64;
        /// Write an I8 record.
        i8: i8 => I8;
        /// Write an I16 record.
        i16: i16 => I16;
        /// Write an I32 record.
        i32: i32 => I32;
        /// Write an I64 record.
        i64: i64 => I64;
        /// Write an F32 record.
        f32: f32 => F32;
        /// Write an F64 record.
        f64: f64 => F64;
    }

    vector_writers! {
        /// Write an F32V2 record.
        f32v2: [f32; 2] => F32V2;
        /// Write an F32V3 record.
        f32v3: [f32; 3] => F32V3;
        /// Write an F32V4 record.
        f32v4: [f32; 4] => F32V4;
        /// Write an I32V2 record.
        i32v2: [i32; 2] => I32V2;
        /// Write an I32V3 record.
        i32v3: [i32; 3] => I32V3;
        /// Write an I32V4 record.
        i32v4: [i32; 4] => I32V4;
    }

    /// Write a string record. The text is followed by a NUL on the wire,
    /// which readers strip again.
    pub fn string(&mut self, text: &str) -> Result<(), EncodeError> {
        self.string_bytes(text.as_bytes())
    }

    /// Write a string record from raw bytes, which need not be UTF-8.
    pub fn string_bytes(&mut self, text: &[u8]) -> Result<(), EncodeError> {
        self.sized([Tag::String0, Tag::String8, Tag::String64], text, true)
    }

    /// Write a binary record.
    pub fn binary(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        self.sized([Tag::Binary0, Tag::Binary8, Tag::Binary64], data, false)
    }

    /// Open an object. Keys and values follow in turns.
    pub fn begin_object(&mut self) -> Result<(), EncodeError> {
        self.open(Tag::ObjectBegin)
    }

    /// Close an object.
    pub fn end_object(&mut self) -> Result<(), EncodeError> {
        self.close(Tag::ObjectEnd)
    }

    /// Open a list.
    pub fn begin_list(&mut self) -> Result<(), EncodeError> {
        self.open(Tag::ListBegin)
    }

    /// Close a list.
    pub fn end_list(&mut self) -> Result<(), EncodeError> {
        self.close(Tag::ListEnd)
    }

    /// Open an object that readers can resynchronise on.
    ///
    /// The same `marker` must be passed to
    /// [`end_recovery_object`](Self::end_recovery_object). Text unlikely to
    /// occur in payloads, such as `"TypeName:Magic"`, works best.
    ///
    /// # Errors
    /// [`EncodeError::TagTooLong`] if `marker` exceeds 255 bytes.
    pub fn begin_recovery_object(&mut self, marker: &str) -> Result<(), EncodeError> {
        self.marker(Tag::RecoveryObjectBegin, marker)?;
        self.depth += 1;
        Ok(())
    }

    /// Close an object opened with
    /// [`begin_recovery_object`](Self::begin_recovery_object).
    ///
    /// # Errors
    /// [`EncodeError::TagTooLong`] if `marker` exceeds 255 bytes.
    pub fn end_recovery_object(&mut self, marker: &str) -> Result<(), EncodeError> {
        self.marker(Tag::RecoveryObjectEnd, marker)?;
        self.leave();
        Ok(())
    }

    /// Open a list that readers can resynchronise on.
    ///
    /// # Errors
    /// [`EncodeError::TagTooLong`] if `marker` exceeds 255 bytes.
    pub fn begin_recovery_list(&mut self, marker: &str) -> Result<(), EncodeError> {
        self.marker(Tag::RecoveryListBegin, marker)?;
        self.depth += 1;
        Ok(())
    }

    /// Close a list opened with
    /// [`begin_recovery_list`](Self::begin_recovery_list).
    ///
    /// # Errors
    /// [`EncodeError::TagTooLong`] if `marker` exceeds 255 bytes.
    pub fn end_recovery_list(&mut self, marker: &str) -> Result<(), EncodeError> {
        self.marker(Tag::RecoveryListEnd, marker)?;
        self.leave();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut Writer<Vec<u8>>) -> Result<(), EncodeError>) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new());
        f(&mut writer).unwrap();
        writer.into_inner()
    }

    #[test]
    fn records_are_tag_plus_payload() {
        assert_eq!(written(|w| w.null()), [0]);
        assert_eq!(written(|w| w.bool(true)), [16, 1]);
        assert_eq!(written(|w| w.bool(false)), [16, 0]);
        assert_eq!(written(|w| w.u8(0xAB)), [17, 0xAB]);
        assert_eq!(written(|w| w.u16(0x0102)), [18, 2, 1]);
        assert_eq!(written(|w| w.i32(0x7F00_BEEF)), [23, 0xEF, 0xBE, 0x00, 0x7F]);
        assert_eq!(written(|w| w.i64(-1)), [24, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(written(|w| w.f32(3.5)), [27, 0, 0, 0x60, 0x40]);
        assert_eq!(written(|w| w.f64(1.0)).len(), 9);
    }

    #[test]
    fn vectors_are_packed_components() {
        let bytes = written(|w| w.i32v3([1, -1, 2]));
        assert_eq!(bytes, [33, 1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 2, 0, 0, 0]);
        assert_eq!(written(|w| w.f32v4([0.0; 4])).len(), 17);
        assert_eq!(written(|w| w.f32v2([1.0, 2.0]))[0], Tag::F32V2.byte());
    }

    #[test]
    fn string_length_encodings() {
        assert_eq!(written(|w| w.string("")), [10]);
        assert_eq!(written(|w| w.string("hi")), [11, 2, b'h', b'i', 0]);

        let max_short = "s".repeat(255);
        let bytes = written(|w| w.string(&max_short));
        assert_eq!(&bytes[..2], [11, 255]);
        assert_eq!(bytes.len(), 2 + 255 + 1);
        assert_eq!(bytes.last(), Some(&0));

        let long = "l".repeat(256);
        let bytes = written(|w| w.string(&long));
        assert_eq!(bytes[0], 12);
        assert_eq!(&bytes[1..9], 256u64.to_le_bytes());
        assert_eq!(bytes.len(), 1 + 8 + 256 + 1);
        assert_eq!(bytes.last(), Some(&0));
    }

    #[test]
    fn binary_length_encodings_have_no_nul() {
        assert_eq!(written(|w| w.binary(&[])), [13]);
        assert_eq!(written(|w| w.binary(&[7, 8])), [14, 2, 7, 8]);

        let long = vec![0xEE; 300];
        let bytes = written(|w| w.binary(&long));
        assert_eq!(bytes[0], 15);
        assert_eq!(&bytes[1..9], 300u64.to_le_bytes());
        assert_eq!(bytes.len(), 1 + 8 + 300);
    }

    #[test]
    fn aggregates_track_depth() {
        let mut writer = Writer::new(Vec::new());
        writer.begin_list().unwrap();
        writer.begin_recovery_object("M").unwrap();
        assert_eq!(writer.depth(), 2);
        writer.end_recovery_object("M").unwrap();
        writer.end_list().unwrap();
        assert_eq!(writer.depth(), 0);
        assert_eq!(writer.get_ref(), &[1, 3, 1, b'M', 0, 8, 1, b'M', 0, 5]);
    }

    #[test]
    fn unmatched_ends_are_written_as_is() {
        let mut writer = Writer::new(Vec::new());
        writer.end_object().unwrap();
        assert_eq!(writer.get_ref(), &[6]);
        assert_eq!(writer.depth(), 0);

        writer.begin_list().unwrap();
        writer.end_list().unwrap();
        writer.end_recovery_list("Q").unwrap();
        assert_eq!(writer.depth(), 0);
        assert_eq!(writer.get_ref(), &[6, 1, 5, 7, 1, b'Q', 0]);
    }

    #[test]
    fn overlong_marker_is_rejected() {
        let mut writer = Writer::new(Vec::new());
        let marker = "m".repeat(256);
        let err = writer.begin_recovery_list(&marker).unwrap_err();
        assert!(matches!(err, EncodeError::TagTooLong { len: 256 }));
        assert_eq!(writer.depth(), 0);
        assert!(writer.get_ref().is_empty());

        writer.begin_recovery_list(&marker[..255]).unwrap();
        assert_eq!(writer.get_ref().len(), MAX_MARKER_LEN);
    }

    #[test]
    fn writes_through_borrowed_sink() {
        let mut out = Vec::new();
        {
            let mut writer = Writer::new(&mut out);
            writer.u32(5).unwrap();
        }
        assert_eq!(out, [19, 5, 0, 0, 0]);
    }
}

use std::fmt;

use tracing::{debug, trace, warn};

use super::{
    DecodeError, Deserialize, Diagnostic, DiagnosticKind, Payload, Tag, Value,
    writer::marker_record,
};
use crate::scan::{MAX_MARKER_LEN, ScratchBuf, find_from};

type ErrorSink<'a> = Box<dyn FnMut(&Diagnostic) + 'a>;

/// Bounds-checked cursor over one record.
struct Record<'a> {
    data: &'a [u8],
    tag: Tag,
    start: usize,
    pos: usize,
}

impl<'a> Record<'a> {
    const fn truncated(&self) -> DecodeError {
        DecodeError::Truncated {
            tag: self.tag,
            offset: self.start,
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.truncated())?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N)?;
        bytes.try_into().map_err(|_| self.truncated())
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.array::<1>()?;
        Ok(byte)
    }

    fn nul(&mut self) -> Result<(), DecodeError> {
        match self.byte()? {
            0 => Ok(()),
            _ => Err(DecodeError::MissingNul {
                tag: self.tag,
                offset: self.start,
            }),
        }
    }

    /// Length prefix, one or eight bytes wide depending on the tag.
    fn len(&mut self, wide: bool) -> Result<usize, DecodeError> {
        if wide {
            let len = u64::from_le_bytes(self.array()?);
            usize::try_from(len).map_err(|_| self.truncated())
        } else {
            self.byte().map(usize::from)
        }
    }

    fn components<const W: usize>(&mut self) -> Result<[[u8; 4]; 4], DecodeError> {
        let mut out = [[0; 4]; 4];
        for slot in out.iter_mut().take(W) {
            *slot = self.array()?;
        }
        Ok(out)
    }

    fn payload(&mut self) -> Result<Payload<'a>, DecodeError> {
        let payload = match self.tag {
            Tag::Null
            | Tag::ListBegin
            | Tag::ObjectBegin
            | Tag::ListEnd
            | Tag::ObjectEnd => Payload::None,
            Tag::RecoveryObjectBegin
            | Tag::RecoveryListBegin
            | Tag::RecoveryListEnd
            | Tag::RecoveryObjectEnd => {
                let len = self.len(false)?;
                let text = self.take(len)?;
                self.nul()?;
                Payload::Bytes(text)
            },
            Tag::Error => {
                return Err(DecodeError::UnknownTag {
                    tag: Tag::Error.byte(),
                    offset: self.start,
                });
            },
            Tag::String0 | Tag::Binary0 => Payload::Bytes(&[]),
            Tag::String8 | Tag::String64 => {
                let len = self.len(self.tag == Tag::String64)?;
                let text = self.take(len)?;
                self.nul()?;
                Payload::Bytes(text)
            },
            Tag::Binary8 | Tag::Binary64 => {
                let len = self.len(self.tag == Tag::Binary64)?;
                Payload::Bytes(self.take(len)?)
            },
            Tag::Bool => match self.byte()? {
                0 => Payload::Bool(false),
                1 => Payload::Bool(true),
                byte => {
                    return Err(DecodeError::InvalidBool {
                        byte,
                        offset: self.start,
                    });
                },
            },
            Tag::U8 => Payload::Int(i64::from(self.byte()?)),
            Tag::U16 => Payload::Int(i64::from(u16::from_le_bytes(self.array()?))),
            Tag::U32 => Payload::Int(i64::from(u32::from_le_bytes(self.array()?))),
            // bit pattern kept; Value::as_u64 undoes it
            Tag::U64 => Payload::Int(i64::from_le_bytes(self.array()?)),
            Tag::I8 => Payload::Int(i64::from(i8::from_le_bytes(self.array()?))),
            Tag::I16 => Payload::Int(i64::from(i16::from_le_bytes(self.array()?))),
            Tag::I32 => Payload::Int(i64::from(i32::from_le_bytes(self.array()?))),
            Tag::I64 => Payload::Int(i64::from_le_bytes(self.array()?)),
            Tag::F8 => Payload::Float(f64::from(self.byte()?)),
            Tag::F16 => Payload::Float(f64::from(u16::from_le_bytes(self.array()?))),
            Tag::F32 => Payload::Float(f64::from(f32::from_le_bytes(self.array()?))),
            Tag::F64 => Payload::Float(f64::from_le_bytes(self.array()?)),
            Tag::F32V2 => Payload::F32s(self.components::<2>()?.map(f32::from_le_bytes)),
            Tag::F32V3 => Payload::F32s(self.components::<3>()?.map(f32::from_le_bytes)),
            Tag::F32V4 => Payload::F32s(self.components::<4>()?.map(f32::from_le_bytes)),
            Tag::I32V2 => Payload::I32s(self.components::<2>()?.map(i32::from_le_bytes)),
            Tag::I32V3 => Payload::I32s(self.components::<3>()?.map(i32::from_le_bytes)),
            Tag::I32V4 => Payload::I32s(self.components::<4>()?.map(i32::from_le_bytes)),
        };
        Ok(payload)
    }
}

/// Streaming TBSF decoder over a borrowed byte slice.
///
/// [`value`](Self::value) decodes one record at a time. The iterators
/// [`iterate_list`](Self::iterate_list) and
/// [`iterate_object`](Self::iterate_object) walk an aggregate's direct
/// children, skipping whatever the caller left unread inside nested
/// aggregates.
///
/// Malformed input never panics and never aborts the read. A bad record
/// comes back as an ERROR [`Value`] with the reader rewound to the record's
/// start. When an iterator meets a bad record or an end record that does not
/// close its aggregate, it searches forward for the byte sequence that
/// would close it and resumes from there.
///
/// Decode errors and failed searches are logged through `tracing` and, if
/// one is installed, passed to the error sink.
///
/// # Examples
///
/// ```
/// use skein::tbsf::{Reader, Tag, Writer};
///
/// # fn main() -> Result<(), skein::tbsf::EncodeError> {
/// let mut writer = Writer::new(Vec::new());
/// writer.begin_list()?;
/// writer.u8(1)?;
/// writer.i64(-2)?;
/// writer.end_list()?;
/// let bytes = writer.into_inner();
///
/// let mut reader = Reader::new(&bytes);
/// let list = reader.value();
/// assert_eq!(list.tag(), Tag::LIST);
///
/// let mut sum = 0;
/// while let Some(item) = reader.iterate_list(&list) {
///     sum += item.as_i64().unwrap_or(0);
/// }
/// assert_eq!(sum, -1);
/// assert!(reader.is_eof());
/// # Ok(())
/// # }
/// ```
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
    depth: usize,
    error_count: usize,
    recovery_count: usize,
    error_sink: Option<ErrorSink<'a>>,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            depth: 0,
            error_count: 0,
            recovery_count: 0,
            error_sink: None,
        }
    }

    /// Install a callback receiving every decode error and failed recovery,
    /// in addition to the `tracing` events.
    #[must_use]
    pub fn with_error_sink<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&Diagnostic) + 'a,
    {
        self.error_sink = Some(Box::new(sink));
        self
    }

    /// Current offset into the input.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of aggregates entered and not yet left.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Decode errors plus failed recoveries seen so far.
    pub const fn error_count(&self) -> usize {
        self.error_count
    }

    /// Recovery searches started so far, successful or not.
    pub const fn recovery_count(&self) -> usize {
        self.recovery_count
    }

    /// `true` once every byte has been consumed.
    pub const fn is_eof(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// The whole input.
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    fn report(&mut self, kind: DiagnosticKind) {
        self.error_count += 1;
        let diagnostic = Diagnostic {
            depth: self.depth,
            offset: self.offset,
            kind,
        };
        if let Some(sink) = self.error_sink.as_mut() {
            sink(&diagnostic);
        }
    }

    fn decode(&self) -> Result<(Tag, Payload<'a>, usize), DecodeError> {
        let start = self.offset;
        let byte = *self
            .data
            .get(start)
            .ok_or(DecodeError::Eof { offset: start })?;
        let tag =
            Tag::try_from(byte).map_err(|tag| DecodeError::UnknownTag { tag, offset: start })?;

        let mut record = Record {
            data: self.data,
            tag,
            start,
            pos: start + 1,
        };
        let payload = record.payload()?;
        Ok((tag, payload, record.pos))
    }

    /// Decode the next record.
    ///
    /// Begin records raise the depth and end records lower it. On malformed
    /// input the returned value is an ERROR carrying the reason, the offset
    /// stays at the bad record and the error count goes up.
    pub fn value(&mut self) -> Value<'a> {
        let depth = self.depth;
        match self.decode() {
            Ok((tag, payload, end)) => {
                let value = Value::new(tag, depth, self.offset, payload);
                self.offset = end;
                if tag.is_begin() {
                    self.depth += 1;
                } else if tag.is_end() {
                    self.depth = self.depth.saturating_sub(1);
                }
                value
            },
            Err(err) => {
                warn!(depth, offset = self.offset, error = %err, "malformed record");
                self.report(DiagnosticKind::Decode(err));
                Value::failed(err, depth)
            },
        }
    }

    /// Decode the next record, reporting malformed input as an error.
    ///
    /// # Errors
    /// The [`DecodeError`] that [`value`](Self::value) would have carried.
    pub fn try_value(&mut self) -> Result<Value<'a>, DecodeError> {
        let value = self.value();
        value.error().map_or(Ok(value), Err)
    }

    /// Decode the next record and convert it with [`Deserialize`].
    ///
    /// Aggregates are consumed up to and including their end record.
    pub fn read<T: Deserialize<'a>>(&mut self) -> Option<T> {
        let value = self.value();
        T::deserialize(self, &value)
    }

    /// Read and drop records until the depth is back down to `depth`.
    ///
    /// Returns `false` if a malformed record got in the way.
    pub fn skip_to_depth(&mut self, depth: usize) -> bool {
        while self.depth > depth {
            if self.value().is_error() {
                return false;
            }
        }
        self.depth == depth
    }

    /// Next child of `list`, or `None` once the list is closed.
    ///
    /// Children the caller did not finish reading are skipped first. If the
    /// list turns out to be malformed the reader searches for its end
    /// record and continues after it; `None` is returned either way.
    ///
    /// # Panics
    /// In debug builds, if `list` is not a begin record.
    pub fn iterate_list(&mut self, list: &Value<'a>) -> Option<Value<'a>> {
        debug_assert!(list.tag().is_list(), "iterate_list on a {}", list.exact_tag());
        if !self.enter(list) {
            return None;
        }

        let item = self.value();
        if item.tag().is_end_or_error() {
            if !Self::closes(list, &item) {
                self.recover(list);
            }
            return None;
        }
        Some(item)
    }

    /// Next key and value of `object`, or `None` once the object is closed.
    ///
    /// Keys are usually strings but any record is accepted. An object that
    /// closes between a key and its value is malformed and triggers the
    /// same recovery as [`iterate_list`](Self::iterate_list).
    ///
    /// # Panics
    /// In debug builds, if `object` is not a begin record.
    pub fn iterate_object(&mut self, object: &Value<'a>) -> Option<(Value<'a>, Value<'a>)> {
        debug_assert!(
            object.tag().is_object(),
            "iterate_object on a {}",
            object.exact_tag()
        );
        if !self.enter(object) {
            return None;
        }

        let key = self.value();
        if key.tag().is_end_or_error() {
            if !Self::closes(object, &key) {
                self.recover(object);
            }
            return None;
        }

        if !self.skip_to_depth(object.depth() + 1) {
            self.recover(object);
            return None;
        }

        let value = self.value();
        if value.tag().is_end_or_error() {
            self.recover(object);
            return None;
        }
        Some((key, value))
    }

    /// Iterator over the children of `list`.
    pub const fn list_items<'r>(&'r mut self, list: Value<'a>) -> ListItems<'r, 'a> {
        ListItems { reader: self, list }
    }

    /// Iterator over the key/value pairs of `object`.
    pub const fn object_entries<'r>(&'r mut self, object: Value<'a>) -> ObjectEntries<'r, 'a> {
        ObjectEntries {
            reader: self,
            object,
        }
    }

    /// Position the reader directly inside `aggregate`, skipping unread
    /// nested content. `false` if the aggregate is already closed or could
    /// not be reached.
    fn enter(&mut self, aggregate: &Value<'a>) -> bool {
        let inner = aggregate.depth() + 1;
        if self.depth < inner {
            return false;
        }
        if !self.skip_to_depth(inner) {
            self.recover(aggregate);
            return false;
        }
        true
    }

    /// `end` closes `aggregate` if its tag matches and, for recovery
    /// aggregates, it repeats the same marker.
    fn closes(aggregate: &Value<'a>, end: &Value<'a>) -> bool {
        aggregate.exact_tag().matching_end() == Some(end.exact_tag())
            && aggregate.marker() == end.marker()
    }

    fn end_record(aggregate: &Value<'a>) -> Option<ScratchBuf<MAX_MARKER_LEN>> {
        let end = aggregate.exact_tag().matching_end()?;
        match aggregate.marker() {
            Some(text) => marker_record(end, text),
            None => {
                let mut buf = ScratchBuf::new();
                buf.push(end.byte());
                Some(buf)
            },
        }
    }

    /// Skip forward past the record that closes `aggregate` and leave the
    /// depth where it was before the aggregate was opened. If no such record
    /// follows, the rest of the input is abandoned.
    fn recover(&mut self, aggregate: &Value<'a>) {
        self.recovery_count += 1;
        trace!(
            depth = self.depth,
            offset = self.offset,
            aggregate = %aggregate.exact_tag(),
            "searching for end record"
        );

        let needle = Self::end_record(aggregate);
        let found = needle
            .as_ref()
            .and_then(|needle| find_from(self.data, needle, self.offset).map(|at| (at, needle.len())));

        match found {
            Some((at, len)) => {
                debug!(
                    depth = aggregate.depth(),
                    offset = self.offset,
                    skipped = at - self.offset,
                    "resynchronised on end record"
                );
                self.offset = at + len;
            },
            None => {
                let end = aggregate.exact_tag().matching_end().unwrap_or(Tag::Error);
                warn!(
                    depth = self.depth,
                    offset = self.offset,
                    end = %end,
                    "end record not found, abandoning input"
                );
                self.report(DiagnosticKind::RecoveryMiss { end });
                self.offset = self.data.len();
            },
        }
        self.depth = aggregate.depth();
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("len", &self.data.len())
            .field("offset", &self.offset)
            .field("depth", &self.depth)
            .field("error_count", &self.error_count)
            .field("recovery_count", &self.recovery_count)
            .field("error_sink", &self.error_sink.is_some())
            .finish()
    }
}

/// Iterator over the children of a list. See [`Reader::list_items`].
#[derive(Debug)]
pub struct ListItems<'r, 'a> {
    reader: &'r mut Reader<'a>,
    list: Value<'a>,
}

impl<'a> ListItems<'_, 'a> {
    /// The underlying reader, for reading into a child aggregate.
    pub const fn reader(&mut self) -> &mut Reader<'a> {
        self.reader
    }
}

impl<'a> Iterator for ListItems<'_, 'a> {
    type Item = Value<'a>;

    fn next(&mut self) -> Option<Value<'a>> {
        self.reader.iterate_list(&self.list)
    }
}

/// Iterator over the entries of an object. See [`Reader::object_entries`].
#[derive(Debug)]
pub struct ObjectEntries<'r, 'a> {
    reader: &'r mut Reader<'a>,
    object: Value<'a>,
}

impl<'a> ObjectEntries<'_, 'a> {
    /// The underlying reader, for reading into a child aggregate.
    pub const fn reader(&mut self) -> &mut Reader<'a> {
        self.reader
    }
}

impl<'a> Iterator for ObjectEntries<'_, 'a> {
    type Item = (Value<'a>, Value<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.iterate_object(&self.object)
    }
}

use std::{fmt, ops::Deref};

/// Longest encoded recovery marker: tag byte, length byte, 255 bytes of
/// text and the trailing NUL.
pub const MAX_MARKER_LEN: usize = 1 + 1 + u8::MAX as usize + 1;

/// Returns the position of the first occurrence of `needle` in `haystack`
/// starting at or after `from`.
///
/// The scan looks for the needle's first byte and only compares the rest
/// of the window once its last byte lines up as well, which keeps the
/// common miss path down to a single byte comparison per position.
///
/// An empty needle matches at `from` as long as `from` lies inside the
/// haystack (its end included).
///
/// # Examples
///
/// ```
/// use skein::scan::find_from;
///
/// let hay = b"abc\x08\x01M\x00abc\x08\x01M\x00";
/// assert_eq!(find_from(hay, b"\x08\x01M\x00", 0), Some(3));
/// assert_eq!(find_from(hay, b"\x08\x01M\x00", 4), Some(10));
/// assert_eq!(find_from(hay, b"\x08\x01N\x00", 0), None);
/// ```
pub fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }

    let Some((&first, rest)) = needle.split_first() else {
        return Some(from);
    };

    // last position at which a full window still fits
    let window_end = haystack.len() - needle.len();
    let mut pos = from;

    while pos <= window_end {
        let start = pos + haystack[pos..=window_end]
            .iter()
            .position(|&b| b == first)?;

        match rest.split_last() {
            None => return Some(start),
            Some((&last, middle)) => {
                let end = start + needle.len() - 1;
                if haystack[end] == last && &haystack[start + 1..end] == middle {
                    return Some(start);
                }
            },
        }

        pos = start + 1;
    }

    None
}

/// Small fixed-capacity byte buffer living on the stack.
///
/// Used to assemble a record (tag plus payload) or a recovery marker before
/// handing it to a sink or a search in one piece.
#[derive(Clone)]
pub struct ScratchBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> ScratchBuf<N> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    /// Appends one byte.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is already full.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        assert!(self.len < N, "scratch buffer overflow");
        self.buf[self.len] = byte;
        self.len += 1;
    }

    /// Appends a run of bytes.
    ///
    /// # Panics
    ///
    /// Panics if the bytes do not fit in the remaining space.
    #[inline]
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        let end = self.len + bytes.len();
        assert!(end <= N, "scratch buffer overflow");
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
    }

    /// Number of bytes written so far.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// `true` if nothing has been written.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl<const N: usize> Default for ScratchBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for ScratchBuf<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<const N: usize> fmt::Debug for ScratchBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuf")
            .field("capacity", &N)
            .field("bytes", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_single_byte() {
        let hay = [1u8, 2, 6, 3, 6];
        assert_eq!(find_from(&hay, &[6], 0), Some(2));
        assert_eq!(find_from(&hay, &[6], 3), Some(4));
        assert_eq!(find_from(&hay, &[6], 5), None);
        assert_eq!(find_from(&hay, &[9], 0), None);
    }

    #[test]
    fn find_two_bytes() {
        let hay = b"aab";
        assert_eq!(find_from(hay, b"ab", 0), Some(1));
        assert_eq!(find_from(hay, b"ba", 0), None);
    }

    #[test]
    fn find_respects_window_end() {
        let hay = b"xxxxabc";
        assert_eq!(find_from(hay, b"abc", 0), Some(4));
        assert_eq!(find_from(hay, b"abcd", 0), None);
        assert_eq!(find_from(hay, b"abc", 5), None);
    }

    #[test]
    fn find_first_and_last_match_but_middle_differs() {
        let hay = b"aXcabc";
        assert_eq!(find_from(hay, b"abc", 0), Some(3));
    }

    #[test]
    fn find_empty_needle() {
        assert_eq!(find_from(b"abc", b"", 1), Some(1));
        assert_eq!(find_from(b"abc", b"", 3), Some(3));
        assert_eq!(find_from(b"abc", b"", 4), None);
    }

    #[test]
    fn find_from_past_end() {
        assert_eq!(find_from(b"abc", b"a", 10), None);
        assert_eq!(find_from(b"", b"a", 0), None);
    }

    #[test]
    fn scratch_accumulates() {
        let mut buf = ScratchBuf::<8>::new();
        assert!(buf.is_empty());
        buf.push(3);
        buf.extend_from_slice(b"ab");
        assert_eq!(buf.len(), 3);
        assert_eq!(&*buf, &[3, b'a', b'b']);
    }

    #[test]
    #[should_panic(expected = "scratch buffer overflow")]
    fn scratch_overflow_panics() {
        let mut buf = ScratchBuf::<2>::new();
        buf.extend_from_slice(b"abc");
    }

    #[test]
    fn marker_fits_scratch() {
        let mut buf = ScratchBuf::<MAX_MARKER_LEN>::new();
        buf.push(8);
        buf.push(255);
        buf.extend_from_slice(&[b'x'; 255]);
        buf.push(0);
        assert_eq!(buf.len(), MAX_MARKER_LEN);
    }
}

//! Incremental character decoding over a [`ByteView`].
//!
//! The decoder frames characters across byte boundaries before any terminator
//! test is applied: a "null" is a decoded code point of zero, which in UTF-16
//! is two zero bytes. Malformed sequences and sequences cut off by end of
//! data decode to U+FFFD, the same lossy behaviour as the platform decoders
//! this replaces; a clean end of data on a character boundary yields `None`.

use crate::bitbuf::{BitBuffer, ByteView};

const REPLACEMENT: char = '\u{FFFD}';

/// Character encodings supported for bound text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    /// Seven-bit ASCII; the default encoding for bound strings.
    #[default]
    Ascii,
    /// ISO Latin Alphabet No. 1; every byte maps to U+00..U+FF.
    Iso8859_1,
    Utf8,
    Utf16Be,
    Utf16Le,
}

impl Charset {
    /// Encoded width of the null terminator in bytes.
    pub fn terminator_width(self) -> u64 {
        match self {
            Charset::Utf16Be | Charset::Utf16Le => 2,
            _ => 1,
        }
    }
}

/// Pulls decoded characters one at a time from a byte view, buffering a
/// pushed-back byte or UTF-16 code unit when a sequence turns out to be
/// malformed partway through.
pub struct TextDecoder<'a, B: BitBuffer + ?Sized> {
    view: ByteView<'a, B>,
    charset: Charset,
    pending_byte: Option<u8>,
    pending_unit: Option<u16>,
}

impl<'a, B: BitBuffer + ?Sized> TextDecoder<'a, B> {
    pub fn new(buf: &'a mut B, charset: Charset) -> Self {
        Self::over(ByteView::new(buf), charset)
    }

    /// Decoder that will consume at most `limit` bytes from the buffer.
    pub fn limited(buf: &'a mut B, charset: Charset, limit: u64) -> Self {
        Self::over(ByteView::limited(buf, limit), charset)
    }

    fn over(view: ByteView<'a, B>, charset: Charset) -> Self {
        TextDecoder { view, charset, pending_byte: None, pending_unit: None }
    }

    pub fn bytes_consumed(&self) -> u64 {
        self.view.bytes_consumed()
    }

    /// Next decoded character, or `None` at end of data on a character
    /// boundary.
    pub fn next_char(&mut self) -> Option<char> {
        match self.charset {
            Charset::Ascii => {
                let b = self.next_byte()?;
                Some(if b < 0x80 { b as char } else { REPLACEMENT })
            }
            Charset::Iso8859_1 => self.next_byte().map(char::from),
            Charset::Utf8 => self.next_utf8(),
            Charset::Utf16Be | Charset::Utf16Le => self.next_utf16(),
        }
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.pending_byte.take().or_else(|| self.view.read())
    }

    fn next_utf8(&mut self) -> Option<char> {
        let lead = self.next_byte()?;
        let (len, init) = match lead {
            0x00..=0x7F => return Some(lead as char),
            0xC2..=0xDF => (2, u32::from(lead & 0x1F)),
            0xE0..=0xEF => (3, u32::from(lead & 0x0F)),
            0xF0..=0xF4 => (4, u32::from(lead & 0x07)),
            // Stray continuation byte or overlong lead.
            _ => return Some(REPLACEMENT),
        };
        let mut cp = init;
        for _ in 1..len {
            match self.next_byte() {
                Some(b) if b & 0xC0 == 0x80 => cp = (cp << 6) | u32::from(b & 0x3F),
                Some(b) => {
                    // Invalid continuation: re-process it as a fresh lead.
                    self.pending_byte = Some(b);
                    return Some(REPLACEMENT);
                }
                // Sequence cut off by end of data.
                None => return Some(REPLACEMENT),
            }
        }
        // Rejects surrogate code points and values past U+10FFFF.
        Some(char::from_u32(cp).unwrap_or(REPLACEMENT))
    }

    fn next_utf16(&mut self) -> Option<char> {
        let unit = match self.pending_unit.take() {
            Some(u) => u,
            None => self.read_unit()?,
        };
        match unit {
            0xD800..=0xDBFF => match self.read_unit() {
                Some(low @ 0xDC00..=0xDFFF) => {
                    let cp = 0x10000
                        + ((u32::from(unit) - 0xD800) << 10)
                        + (u32::from(low) - 0xDC00);
                    char::from_u32(cp)
                }
                Some(other) => {
                    // Unpaired high surrogate; keep the unit for the next call.
                    self.pending_unit = Some(other);
                    Some(REPLACEMENT)
                }
                None => Some(REPLACEMENT),
            },
            0xDC00..=0xDFFF => Some(REPLACEMENT),
            _ => char::from_u32(u32::from(unit)),
        }
    }

    fn read_unit(&mut self) -> Option<u16> {
        let hi = self.next_byte()?;
        let lo = match self.next_byte() {
            Some(b) => b,
            // Odd trailing byte; surface it as one replacement character.
            None => return Some(0xFFFD),
        };
        Some(match self.charset {
            Charset::Utf16Le => u16::from_le_bytes([hi, lo]),
            _ => u16::from_be_bytes([hi, lo]),
        })
    }
}

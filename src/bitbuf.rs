//! Bit-addressable buffer access and the byte-stream view over it.
//!
//! [`BitBuffer`] is the read contract the decoding side consumes: unsigned
//! fixed-width reads advancing an absolute bit cursor. [`SliceBitBuffer`] is
//! the in-memory implementation over a byte slice. [`ByteView`] adapts any
//! bit buffer into a plain unsigned byte stream for the text decoder; running
//! out of bits maps to `None` rather than an error, because exhaustion is a
//! normal termination condition for unbounded-length fields.

use byteorder::{BigEndian, ByteOrder};

/// Raised by a [`BitBuffer`] when fewer bits remain than were requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("bit buffer underflow: requested {requested} bits, {available} available")]
pub struct Underflow {
    pub requested: u32,
    pub available: u64,
}

/// An addressable source of bits. Reads are big-endian (network order) and
/// advance the cursor; the cursor never rewinds during a decode.
pub trait BitBuffer {
    /// Read `bit_width` bits (at most 64) as an unsigned integer.
    fn read_unsigned(&mut self, bit_width: u32) -> Result<u64, Underflow>;

    /// Absolute bit offset of the cursor, for diagnostics.
    fn bit_position(&self) -> u64;

    /// Bits left between the cursor and the end of the buffer.
    fn bits_remaining(&self) -> u64;
}

/// [`BitBuffer`] over a borrowed byte slice.
pub struct SliceBitBuffer<'a> {
    data: &'a [u8],
    pos: u64,
}

impl<'a> SliceBitBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceBitBuffer { data, pos: 0 }
    }
}

impl BitBuffer for SliceBitBuffer<'_> {
    fn read_unsigned(&mut self, bit_width: u32) -> Result<u64, Underflow> {
        if bit_width > 64 || u64::from(bit_width) > self.bits_remaining() {
            return Err(Underflow {
                requested: bit_width,
                available: self.bits_remaining(),
            });
        }
        // Byte-aligned widths take the fast path.
        if self.pos % 8 == 0 {
            let at = (self.pos / 8) as usize;
            let v = match bit_width {
                8 => Some(self.data[at] as u64),
                16 => Some(BigEndian::read_u16(&self.data[at..]) as u64),
                32 => Some(BigEndian::read_u32(&self.data[at..]) as u64),
                64 => Some(BigEndian::read_u64(&self.data[at..])),
                _ => None,
            };
            if let Some(v) = v {
                self.pos += u64::from(bit_width);
                return Ok(v);
            }
        }
        let mut value = 0u64;
        let mut left = bit_width;
        while left > 0 {
            let byte = self.data[(self.pos / 8) as usize];
            let offset = (self.pos % 8) as u32;
            let take = (8 - offset).min(left);
            let shift = 8 - offset - take;
            let mask = ((1u16 << take) - 1) as u8;
            value = (value << take) | u64::from((byte >> shift) & mask);
            self.pos += u64::from(take);
            left -= take;
        }
        Ok(value)
    }

    fn bit_position(&self) -> u64 {
        self.pos
    }

    fn bits_remaining(&self) -> u64 {
        self.data.len() as u64 * 8 - self.pos
    }
}

/// Unsigned byte stream over a [`BitBuffer`]. Each [`read`](ByteView::read)
/// consumes exactly 8 bits; any underflow from the underlying buffer is
/// reported as `None`, leaving the caller to decide whether end of data at
/// that point is an error. An optional byte limit caps how many bytes the
/// view will serve, used by fixed-length decoding to stop the cursor at an
/// exact byte count.
pub struct ByteView<'a, B: BitBuffer + ?Sized> {
    buf: &'a mut B,
    limit: Option<u64>,
    consumed: u64,
}

impl<'a, B: BitBuffer + ?Sized> ByteView<'a, B> {
    pub fn new(buf: &'a mut B) -> Self {
        ByteView { buf, limit: None, consumed: 0 }
    }

    pub fn limited(buf: &'a mut B, limit: u64) -> Self {
        ByteView { buf, limit: Some(limit), consumed: 0 }
    }

    /// Next byte, or `None` once the limit is reached or the buffer has
    /// fewer than 8 bits left.
    pub fn read(&mut self) -> Option<u8> {
        if let Some(limit) = self.limit {
            if self.consumed >= limit {
                return None;
            }
        }
        match self.buf.read_unsigned(8) {
            Ok(v) => {
                self.consumed += 1;
                Some(v as u8)
            }
            Err(_) => None,
        }
    }

    /// Bytes served so far (bytes the bit cursor has advanced through).
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }
}

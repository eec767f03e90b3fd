//! Bit-oriented I/O over byte streams.
//!
//! Bits are packed most-significant first: the first bit written becomes the
//! top bit of the first byte. Writers buffer up to 64 bits in a register and
//! emit whole big-endian words; the final partial word is padded with zero
//! bits on close.

use crate::error::{ModelError, Result};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};

/// Sink for a sequence of bits.
pub trait OutputBitStream {
    /// Write the lowest bit of `bit`.
    fn write_bit(&mut self, bit: u32) -> Result<()>;

    /// Write the low `count` bits of `value`, most significant first.
    /// `count` must be in `1..=64`.
    fn write_bits(&mut self, value: u64, count: u32) -> Result<()>;

    /// Number of bits written so far.
    fn written(&self) -> u64;
}

/// Source of a sequence of bits.
pub trait InputBitStream {
    fn read_bit(&mut self) -> Result<u32>;

    /// Read `count` bits (`1..=64`) and return them right-aligned.
    fn read_bits(&mut self, count: u32) -> Result<u64>;

    /// Number of bits consumed so far.
    fn read(&self) -> u64;
}

#[inline]
fn check_count(count: u32) -> Result<()> {
    if count == 0 || count > 64 {
        return Err(ModelError::InvalidArgument(format!(
            "Invalid bit count: {} (must be in [1..64])",
            count
        )));
    }
    Ok(())
}

#[inline]
fn low_bits(value: u64, count: u32) -> u64 {
    if count == 64 {
        value
    } else {
        value & ((1u64 << count) - 1)
    }
}

/// Bit writer over any [`Write`] sink.
pub struct BitWriter<W: Write> {
    sink: W,
    current: u64,
    // Free bits left in `current`, always in 1..=64.
    avail: u32,
    written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            current: 0,
            avail: 64,
            written: 0,
        }
    }

    /// Flush pending bits (zero padded to a byte boundary) and return the sink.
    pub fn close(mut self) -> Result<W> {
        let used = (64 - self.avail) as usize;
        if used > 0 {
            let bytes = self.current.to_be_bytes();
            self.sink.write_all(&bytes[..(used + 7) / 8])?;
        }
        self.sink.flush()?;
        Ok(self.sink)
    }
}

impl<W: Write> OutputBitStream for BitWriter<W> {
    #[inline]
    fn write_bit(&mut self, bit: u32) -> Result<()> {
        self.write_bits((bit & 1) as u64, 1)
    }

    fn write_bits(&mut self, value: u64, count: u32) -> Result<()> {
        check_count(count)?;
        let value = low_bits(value, count);

        if count < self.avail {
            self.avail -= count;
            self.current |= value << self.avail;
        } else {
            let remaining = count - self.avail;
            self.current |= value >> remaining;
            self.sink.write_u64::<BigEndian>(self.current)?;
            self.avail = 64 - remaining;
            self.current = if remaining == 0 { 0 } else { value << self.avail };
        }

        self.written += count as u64;
        Ok(())
    }

    fn written(&self) -> u64 {
        self.written
    }
}

/// Bit reader over any [`Read`] source.
pub struct BitReader<R: Read> {
    source: R,
    current: u64,
    // Valid bits left in the low end of `current`.
    avail: u32,
    read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            current: 0,
            avail: 0,
            read: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn refill(&mut self) -> Result<()> {
        let mut buf = [0u8; 8];
        let mut filled = 0;

        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            return Err(ModelError::UnexpectedEndOfStream(self.read));
        }

        self.current = BigEndian::read_u64(&buf) >> (8 * (8 - filled));
        self.avail = 8 * filled as u32;
        Ok(())
    }
}

impl<R: Read> InputBitStream for BitReader<R> {
    #[inline]
    fn read_bit(&mut self) -> Result<u32> {
        Ok(self.read_bits(1)? as u32)
    }

    fn read_bits(&mut self, count: u32) -> Result<u64> {
        check_count(count)?;
        let mut result = 0u64;
        let mut needed = count;

        while needed > 0 {
            if self.avail == 0 {
                self.refill()?;
            }

            let take = needed.min(self.avail);
            let chunk = low_bits(self.current >> (self.avail - take), take);
            result = if take == 64 { chunk } else { (result << take) | chunk };
            self.avail -= take;
            needed -= take;
        }

        self.read += count as u64;
        Ok(result)
    }

    fn read(&self) -> u64 {
        self.read
    }
}

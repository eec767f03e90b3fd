//! Alphabet representation and its compact bit-level encoding.
//!
//! Wire format:
//!
//! ```text
//! mode(1)
//!   0 (full):    shortcut(1)
//!                  0: 256 symbols
//!                  1: log_minus_1(3) count(log)
//!   1 (partial): last_mask(5) mask(8) * (last_mask + 1)
//! ```
//!
//! In full mode the alphabet is `0..count`. In partial mode bit `j` of mask
//! byte `i` marks symbol `8 * i + j`.

use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::error::{ModelError, Result};

pub const MAX_ALPHABET_SIZE: usize = 256;

const FULL_ALPHABET: u32 = 0;
const PARTIAL_ALPHABET: u32 = 1;
const ALPHABET_256: u32 = 0;
const ALPHABET_NOT_256: u32 = 1;

/// Strictly increasing set of symbols, holding at most `capacity` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<u8>,
    capacity: usize,
}

impl Alphabet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            symbols: Vec::with_capacity(capacity.min(MAX_ALPHABET_SIZE)),
            capacity,
        }
    }

    /// Empty alphabet over the whole byte range.
    pub fn bytes() -> Self {
        Self::with_capacity(MAX_ALPHABET_SIZE)
    }

    pub fn from_symbols(symbols: &[u8], capacity: usize) -> Result<Self> {
        let mut alphabet = Self::with_capacity(capacity);
        for &symbol in symbols {
            alphabet.push(symbol)?;
        }
        Ok(alphabet)
    }

    /// Append `symbol`, which must be greater than the last one.
    pub fn push(&mut self, symbol: u8) -> Result<()> {
        if self.symbols.len() >= self.capacity {
            return Err(ModelError::AlphabetFull(self.capacity));
        }
        if let Some(&last) = self.symbols.last() {
            if symbol <= last {
                return Err(ModelError::InvalidArgument(format!(
                    "Alphabet symbols must be strictly increasing, got {} after {}",
                    symbol, last
                )));
            }
        }
        self.symbols.push(symbol);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.symbols.binary_search(&symbol).is_ok()
    }

    /// Whether the symbols are exactly `0..len`.
    fn is_prefix(&self) -> bool {
        self.symbols.iter().enumerate().all(|(i, &s)| s as usize == i)
    }
}

/// Write `alphabet` to the bitstream and return the number of symbols written.
///
/// The capacity must be a power of 2 up to 256. A full alphabet (as many
/// symbols as the capacity) is only written when its symbols are `0..count`.
pub fn encode_alphabet<B: OutputBitStream + ?Sized>(
    bs: &mut B,
    alphabet: &Alphabet,
) -> Result<usize> {
    let alphabet_size = alphabet.capacity();
    let count = alphabet.len();

    if alphabet_size & alphabet_size.wrapping_sub(1) != 0 {
        return Err(ModelError::InvalidCapacity(alphabet_size));
    }

    if alphabet_size > MAX_ALPHABET_SIZE {
        return Err(ModelError::AlphabetTooLarge(alphabet_size));
    }

    if count == alphabet_size && !alphabet.is_prefix() {
        return Err(ModelError::InvalidArgument(format!(
            "A full alphabet of {} symbols must be 0..{}",
            count, count
        )));
    }

    let last = match alphabet.symbols().last() {
        Some(&last) if count != alphabet_size => last as usize,
        _ => {
            bs.write_bit(FULL_ALPHABET)?;

            if count == MAX_ALPHABET_SIZE {
                bs.write_bit(ALPHABET_256)?;
            } else {
                let log = (usize::BITS - count.leading_zeros()).max(1);
                bs.write_bit(ALPHABET_NOT_256)?;
                bs.write_bits((log - 1) as u64, 3)?;
                bs.write_bits(count as u64, log)?;
            }

            return Ok(count);
        }
    };

    bs.write_bit(PARTIAL_ALPHABET)?;
    let mut masks = [0u8; 32];

    for &symbol in alphabet.symbols() {
        masks[symbol as usize >> 3] |= 1 << (symbol & 7);
    }

    let last_mask = last >> 3;
    bs.write_bits(last_mask as u64, 5)?;

    for &mask in &masks[..=last_mask] {
        bs.write_bits(mask as u64, 8)?;
    }

    Ok(count)
}

/// Read an alphabet from the bitstream into `alphabet` and return the number
/// of symbols read.
///
/// Fails when the decoded alphabet has more symbols than the capacity of `alphabet`.
pub fn decode_alphabet<B: InputBitStream + ?Sized>(
    bs: &mut B,
    alphabet: &mut Alphabet,
) -> Result<usize> {
    alphabet.clear();

    if bs.read_bit()? == FULL_ALPHABET {
        let alphabet_size = if bs.read_bit()? == ALPHABET_256 {
            MAX_ALPHABET_SIZE
        } else {
            let log = 1 + bs.read_bits(3)? as u32;
            bs.read_bits(log)? as usize
        };

        if alphabet_size > alphabet.capacity() {
            return Err(ModelError::InvalidBitstream(format!(
                "incorrect alphabet size: {}",
                alphabet_size
            )));
        }

        alphabet.symbols.extend((0..alphabet_size).map(|s| s as u8));
        return Ok(alphabet_size);
    }

    let last_mask = bs.read_bits(5)? as usize;

    for i in 0..=last_mask {
        let mask = bs.read_bits(8)? as u8;

        for j in 0..8 {
            if mask & (1 << j) == 0 {
                continue;
            }

            if alphabet.len() >= alphabet.capacity() {
                return Err(ModelError::InvalidBitstream(format!(
                    "incorrect alphabet size: more than {} symbols",
                    alphabet.capacity()
                )));
            }
            alphabet.symbols.push(((i << 3) + j) as u8);
        }
    }

    Ok(alphabet.len())
}

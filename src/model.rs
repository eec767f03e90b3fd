//! Per-block order-0 frequency model and its header format.
//!
//! ```text
//! flags(8)
//! varint(block_len)
//! if neither STORED nor EMPTY:
//!   varint(scale)
//!   alphabet
//!   varint(freq) for each symbol of the alphabet
//! ```

use crate::alphabet::{decode_alphabet, encode_alphabet, Alphabet};
use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::config::{MAX_SCALE, MIN_SCALE};
use crate::error::{ModelError, Result};
use crate::histogram::{first_order_entropy_1024, is_incompressible};
use crate::normalize::normalize_frequencies;
use crate::varint::{read_var_int, write_var_int, MAX_VAR_INT};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ModelFlags: u8 {
        const STORED = 0b00000001;
        const EMPTY  = 0b00000010;
    }
}

/// Normalized symbol statistics of one block, ready for an order-0 entropy coder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyModel {
    flags: ModelFlags,
    block_len: u32,
    scale: u32,
    alphabet: Alphabet,
    freqs: [u32; 256],
}

impl FrequencyModel {
    /// Build the model of `block` with frequencies summing to `scale`.
    pub fn build(block: &[u8], scale: u32) -> Result<Self> {
        let mut histo = [0u32; 256];
        let entropy = first_order_entropy_1024(block, &mut histo);
        let block_len = block_len(block.len())?;
        Self::from_histogram(histo, block_len, entropy, scale)
    }

    /// Build a model from an order-0 histogram already computed over `block_len` bytes.
    ///
    /// Blocks whose entropy is above the incompressible threshold are marked
    /// [`ModelFlags::STORED`] and carry no frequencies.
    pub fn from_histogram(
        histo: [u32; 256],
        block_len: u32,
        entropy_1024: u32,
        scale: u32,
    ) -> Result<Self> {
        if block_len > MAX_VAR_INT {
            return Err(ModelError::InvalidArgument(format!(
                "Block length {} exceeds the maximum of {}",
                block_len, MAX_VAR_INT
            )));
        }

        if block_len == 0 {
            return Ok(Self::without_frequencies(ModelFlags::EMPTY, 0));
        }

        if is_incompressible(entropy_1024) {
            return Ok(Self::without_frequencies(ModelFlags::STORED, block_len));
        }

        let mut freqs = histo;
        let mut alphabet = Alphabet::bytes();
        normalize_frequencies(&mut freqs, &mut alphabet, block_len, scale)?;

        Ok(Self {
            flags: ModelFlags::empty(),
            block_len,
            scale,
            alphabet,
            freqs,
        })
    }

    fn without_frequencies(flags: ModelFlags, block_len: u32) -> Self {
        Self {
            flags,
            block_len,
            scale: 0,
            alphabet: Alphabet::bytes(),
            freqs: [0; 256],
        }
    }

    pub fn flags(&self) -> ModelFlags {
        self.flags
    }

    pub fn is_stored(&self) -> bool {
        self.flags.contains(ModelFlags::STORED)
    }

    pub fn block_len(&self) -> u32 {
        self.block_len
    }

    /// Sum of the frequencies, 0 for stored or empty blocks.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn frequencies(&self) -> &[u32; 256] {
        &self.freqs
    }

    pub fn frequency(&self, symbol: u8) -> u32 {
        self.freqs[symbol as usize]
    }

    /// Cumulative frequency table: symbol `s` owns `[cum[s], cum[s + 1])`.
    pub fn cumulative(&self) -> [u32; 257] {
        let mut cumulative = [0u32; 257];
        for i in 0..256 {
            cumulative[i + 1] = cumulative[i] + self.freqs[i];
        }
        cumulative
    }

    /// Write the model header and return the number of bits written.
    pub fn write<B: OutputBitStream + ?Sized>(&self, bs: &mut B) -> Result<u64> {
        let start = bs.written();
        bs.write_bits(self.flags.bits() as u64, 8)?;
        write_var_int(bs, self.block_len)?;

        if self.flags.is_empty() {
            write_var_int(bs, self.scale)?;
            encode_alphabet(bs, &self.alphabet)?;

            for &symbol in self.alphabet.symbols() {
                write_var_int(bs, self.freqs[symbol as usize])?;
            }
        }

        Ok(bs.written() - start)
    }

    /// Read a model header written by [`FrequencyModel::write`].
    pub fn read<B: InputBitStream + ?Sized>(bs: &mut B) -> Result<Self> {
        let bits = bs.read_bits(8)? as u8;
        let flags = ModelFlags::from_bits(bits)
            .ok_or_else(|| {
                ModelError::InvalidBitstream(format!("unknown model flags: {:#04x}", bits))
            })?;
        let block_len = read_var_int(bs)?;

        if flags.contains(ModelFlags::EMPTY) != (block_len == 0) {
            return Err(ModelError::InvalidBitstream(format!(
                "flags {:?} do not match block length {}",
                flags, block_len
            )));
        }

        if !flags.is_empty() {
            return Ok(Self::without_frequencies(flags, block_len));
        }

        let scale = read_var_int(bs)?;
        if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
            return Err(ModelError::InvalidBitstream(format!("invalid scale: {}", scale)));
        }

        let mut alphabet = Alphabet::bytes();
        decode_alphabet(bs, &mut alphabet)?;
        if alphabet.is_empty() {
            return Err(ModelError::InvalidBitstream("empty alphabet".to_string()));
        }

        let mut freqs = [0u32; 256];
        let mut sum = 0u64;

        for &symbol in alphabet.symbols() {
            let freq = read_var_int(bs)?;
            if freq == 0 {
                return Err(ModelError::InvalidBitstream(format!(
                    "null frequency for symbol {}",
                    symbol
                )));
            }
            freqs[symbol as usize] = freq;
            sum += freq as u64;
        }

        if sum != scale as u64 {
            return Err(ModelError::InvalidBitstream(format!(
                "frequencies sum to {}, expected {}",
                sum, scale
            )));
        }

        Ok(Self {
            flags,
            block_len,
            scale,
            alphabet,
            freqs,
        })
    }
}

fn block_len(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| ModelError::InvalidArgument(format!("Block too large: {} bytes", len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::{BitReader, BitWriter};
    use std::io::Cursor;

    fn write_then_read(model: &FrequencyModel) -> (u64, FrequencyModel) {
        let mut writer = BitWriter::new(Vec::new());
        let bits = model.write(&mut writer).unwrap();
        let data = writer.close().unwrap();
        let mut reader = BitReader::new(Cursor::new(data));
        (bits, FrequencyModel::read(&mut reader).unwrap())
    }

    #[test]
    fn test_text_block_model() {
        let block = b"Hello, world! This is a test of the frequency model.";
        let model = FrequencyModel::build(block, 4096).unwrap();

        assert!(model.flags().is_empty());
        assert_eq!(model.block_len(), block.len() as u32);
        assert_eq!(model.cumulative()[256], 4096);
        assert!(model.alphabet().contains(b'H'));
        assert!(model.frequency(b' ') > model.frequency(b'H'));

        let (bits, decoded) = write_then_read(&model);
        assert!(bits > 0);
        assert_eq!(decoded, model);
    }

    #[test]
    fn test_single_symbol_block() {
        let model = FrequencyModel::build(&[7u8; 500], 1024).unwrap();
        assert_eq!(model.alphabet().symbols(), &[7]);
        assert_eq!(model.frequency(7), 1024);
        assert_eq!(write_then_read(&model).1, model);
    }

    #[test]
    fn test_empty_and_stored_blocks() {
        let empty = FrequencyModel::build(&[], 4096).unwrap();
        assert_eq!(empty.flags(), ModelFlags::EMPTY);
        let (bits, decoded) = write_then_read(&empty);
        assert_eq!(bits, 16);
        assert_eq!(decoded, empty);

        let uniform: Vec<u8> = (0..4096).map(|i| (i % 256) as u8).collect();
        let stored = FrequencyModel::build(&uniform, 4096).unwrap();
        assert!(stored.is_stored());
        assert_eq!(stored.scale(), 0);
        assert!(stored.alphabet().is_empty());
        assert_eq!(write_then_read(&stored).1, stored);
    }

    #[test]
    fn test_invalid_scale() {
        assert!(matches!(
            FrequencyModel::build(b"abc", 100),
            Err(ModelError::InvalidScale(100))
        ));
    }

    #[test]
    fn test_read_rejects_bad_sum() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0, 8).unwrap();
        write_var_int(&mut writer, 10).unwrap();
        write_var_int(&mut writer, 256).unwrap();
        encode_alphabet(&mut writer, &Alphabet::from_symbols(&[1, 2], 256).unwrap()).unwrap();
        write_var_int(&mut writer, 100).unwrap();
        write_var_int(&mut writer, 100).unwrap();
        let data = writer.close().unwrap();

        let mut reader = BitReader::new(Cursor::new(data));
        assert!(matches!(
            FrequencyModel::read(&mut reader),
            Err(ModelError::InvalidBitstream(_))
        ));
    }

    #[test]
    fn test_read_rejects_unknown_flags() {
        let mut reader = BitReader::new(Cursor::new(vec![0x80u8, 0x01]));
        assert!(matches!(
            FrequencyModel::read(&mut reader),
            Err(ModelError::InvalidBitstream(_))
        ));
    }
}

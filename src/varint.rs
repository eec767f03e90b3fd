//! Variable-length integers written through a bit stream.
//!
//! Each 8-bit group carries 7 payload bits and a continuation flag in bit 7.
//! Groups are emitted least significant first.

use crate::bitstream::{InputBitStream, OutputBitStream};
use crate::error::Result;

/// Maximum number of groups [`read_var_int`] consumes (28 payload bits).
pub const MAX_VAR_INT_GROUPS: usize = 4;

/// Largest value that survives a round trip through [`read_var_int`].
pub const MAX_VAR_INT: u32 = (1 << (7 * MAX_VAR_INT_GROUPS)) - 1;

/// Write `value` and return the number of 8-bit groups written (1 to 5).
pub fn write_var_int<B: OutputBitStream + ?Sized>(bs: &mut B, mut value: u32) -> Result<usize> {
    let mut groups = 1;

    while value >= 0x80 {
        bs.write_bits((0x80 | (value & 0x7F)) as u64, 8)?;
        value >>= 7;
        groups += 1;
    }

    bs.write_bits(value as u64, 8)?;
    Ok(groups)
}

/// Read a value written by [`write_var_int`].
///
/// At most [`MAX_VAR_INT_GROUPS`] groups are read: the continuation flag of
/// the last one is ignored, so values above [`MAX_VAR_INT`] do not survive.
pub fn read_var_int<B: InputBitStream + ?Sized>(bs: &mut B) -> Result<u32> {
    let mut res = 0u32;

    for group in 0..MAX_VAR_INT_GROUPS {
        let value = bs.read_bits(8)? as u32;
        res |= (value & 0x7F) << (7 * group);

        if value < 0x80 {
            break;
        }
    }

    Ok(res)
}

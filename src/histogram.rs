//! Byte histograms and fixed-point entropy estimation.
//!
//! Entropy values are scaled by 1024 so that a block whose bytes are uniformly
//! spread over all 256 values scores 1024.

use crate::error::{ModelError, Result};
use std::num::NonZeroU64;

/// Any block with entropy*1024 greater than this threshold is considered incompressible.
pub const INCOMPRESSIBLE_THRESHOLD: u32 = 973;

/// Fill `histo` with the order-0 byte counts of `block`.
///
/// The histogram is overwritten, not accumulated. Counts above `u32::MAX`
/// saturate.
pub fn compute_histogram(block: &[u8], histo: &mut [u32; 256]) {
    store_counts(&count_bytes(block), histo);
}

fn store_counts(counts: &[u64; 256], histo: &mut [u32; 256]) {
    for (dst, &count) in histo.iter_mut().zip(counts.iter()) {
        *dst = u32::try_from(count).unwrap_or(u32::MAX);
    }
}

fn count_bytes(block: &[u8]) -> [u64; 256] {
    let mut banks = [[0u64; 256]; 4];

    // Process 4 bytes at a time across separate banks
    let chunks = block.chunks_exact(4);
    let remainder = chunks.remainder();

    for chunk in chunks {
        banks[0][chunk[0] as usize] += 1;
        banks[1][chunk[1] as usize] += 1;
        banks[2][chunk[2] as usize] += 1;
        banks[3][chunk[3] as usize] += 1;
    }

    for &b in remainder {
        banks[0][b as usize] += 1;
    }

    let mut counts = [0u64; 256];
    for (i, count) in counts.iter_mut().enumerate() {
        *count = banks[0][i] + banks[1][i] + banks[2][i] + banks[3][i];
    }
    counts
}

/// Order-1 (previous byte → current byte) counts with per-context totals.
#[derive(Debug, Clone)]
pub struct Order1Histogram {
    counts: Vec<u32>,
    totals: [u32; 256],
}

impl Order1Histogram {
    pub fn new() -> Self {
        Self {
            counts: vec![0; 256 * 256],
            totals: [0; 256],
        }
    }

    /// Counts of every symbol seen after `context`.
    pub fn row(&self, context: u8) -> &[u32] {
        let start = context as usize * 256;
        &self.counts[start..start + 256]
    }

    pub fn count(&self, context: u8, symbol: u8) -> u32 {
        self.counts[context as usize * 256 + symbol as usize]
    }

    /// Number of symbols seen after `context`.
    pub fn total(&self, context: u8) -> u32 {
        self.totals[context as usize]
    }

    fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
        self.totals = [0; 256];
    }
}

impl Default for Order1Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill `histo` with order-1 counts of `block`. The first byte is counted in context 0.
pub fn compute_histogram_order1(block: &[u8], histo: &mut Order1Histogram) {
    histo.clear();
    let mut prv = 0usize;

    for &cur in block {
        histo.counts[(prv << 8) | cur as usize] += 1;
        histo.totals[prv] += 1;
        prv = cur as usize;
    }
}

/// Base-2 logarithm of `x` scaled by 1024, rounded down.
pub fn log2_1024(x: u32) -> Result<u32> {
    NonZeroU64::new(x as u64).map(log2_1024_nonzero).ok_or_else(|| {
        ModelError::InvalidArgument("Cannot calculate log of a null value".to_string())
    })
}

fn log2_1024_nonzero(x: NonZeroU64) -> u32 {
    let x = x.get();
    let log = 63 - x.leading_zeros();

    if x & (x - 1) == 0 {
        return log << 10;
    }

    // Mantissa in [1, 2) as a Q30 value; each squaring yields one fraction bit
    let mut y = if log <= 30 {
        x << (30 - log)
    } else {
        x >> (log - 30)
    };
    let mut frac = 0u32;

    for bit in (0..10).rev() {
        y = (y * y) >> 30;
        if y >= 2 << 30 {
            y >>= 1;
            frac |= 1 << bit;
        }
    }

    (log << 10) | frac
}

/// Compute the order-0 entropy of `block` scaled by 1024 (result in `[0..1024]`).
///
/// Fills `histo` with the order-0 frequencies as a side effect (saturated at
/// `u32::MAX`). The entropy itself is computed on 64-bit counts, so blocks
/// longer than `u32::MAX` are scored correctly.
pub fn first_order_entropy_1024(block: &[u8], histo: &mut [u32; 256]) -> u32 {
    let counts = count_bytes(block);
    store_counts(&counts, histo);
    entropy_from_counts(&counts, block.len() as u64)
}

fn entropy_from_counts(counts: &[u64; 256], length: u64) -> u32 {
    let length = match NonZeroU64::new(length) {
        Some(length) => length,
        None => return 0,
    };

    let log_length = log2_1024_nonzero(length);
    let mut sum = 0u128;

    for &count in counts.iter() {
        if let Some(count) = NonZeroU64::new(count) {
            let log_count = log2_1024_nonzero(count);
            sum += (count.get() as u128 * (log_length - log_count) as u128) >> 3;
        }
    }

    (sum / length.get() as u128) as u32
}

/// Whether an entropy*1024 value is above [`INCOMPRESSIBLE_THRESHOLD`].
pub fn is_incompressible(entropy_1024: u32) -> bool {
    entropy_1024 > INCOMPRESSIBLE_THRESHOLD
}

//! Rescaling of symbol frequencies to an exact power-of-two-like total.
//!
//! Every present symbol keeps a frequency of at least 1 and the scaled
//! frequencies sum to exactly `scale`, so the cumulative table built from them
//! partitions `[0, scale)` without gaps.

use crate::alphabet::{Alphabet, MAX_ALPHABET_SIZE};
use crate::config::{MAX_SCALE, MIN_SCALE};
use crate::error::{ModelError, Result};
use log::trace;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Correction candidate, ordered by decreasing error, then decreasing
/// frequency, then decreasing symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    error: i64,
    frequency: u32,
    symbol: u8,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error
            .cmp(&other.error)
            .then(self.frequency.cmp(&other.frequency))
            .then(self.symbol.cmp(&other.symbol))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Scale `freqs` so that they sum to `scale` and collect the present symbols in `alphabet`.
///
/// `total_freq` is the number of observations behind `freqs` and must not be
/// less than their sum. Returns the size of the alphabet. Both `freqs` and
/// `alphabet` are updated in place; on error neither has been modified.
pub fn normalize_frequencies(
    freqs: &mut [u32; 256],
    alphabet: &mut Alphabet,
    total_freq: u32,
    scale: u32,
) -> Result<usize> {
    let capacity = alphabet.capacity();

    if capacity > MAX_ALPHABET_SIZE {
        return Err(ModelError::InvalidAlphabetSize(capacity));
    }

    if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
        return Err(ModelError::InvalidScale(scale));
    }

    if capacity == 0 || total_freq == 0 {
        alphabet.clear();
        return Ok(0);
    }

    if let Some(symbol) = freqs.iter().skip(capacity).position(|&f| f != 0) {
        return Err(ModelError::SymbolOutOfRange {
            symbol: symbol + capacity,
            capacity,
        });
    }

    let observed: u64 = freqs.iter().map(|&f| f as u64).sum();
    if observed > total_freq as u64 {
        return Err(ModelError::InvalidArgument(format!(
            "Frequencies sum to {} but total frequency is {}",
            observed, total_freq
        )));
    }

    alphabet.clear();

    // Shortcut
    if total_freq == scale {
        for (symbol, _) in freqs.iter().enumerate().filter(|&(_, &f)| f != 0) {
            alphabet.push(symbol as u8)?;
        }
        return Ok(alphabet.len());
    }

    let total = total_freq as u64;
    let mut errors = [0i64; 256];
    let mut sum_scaled_freq = 0i64;
    let mut freq_max = 0u32;
    let mut idx_max = 0usize;

    // Scale frequencies by stretching the distribution over the complete range
    for (symbol, freq) in freqs.iter_mut().enumerate() {
        if *freq == 0 {
            continue;
        }

        if *freq > freq_max {
            freq_max = *freq;
            idx_max = symbol;
        }

        let sf = *freq as u64 * scale as u64;

        let scaled_freq = if sf <= total {
            // Quantum of frequency
            1
        } else {
            // Find the best rounding value
            let floor = sf / total;
            let err_ceiling = (floor + 1) * total - sf;
            let err_floor = sf - floor * total;

            if err_ceiling < err_floor {
                errors[symbol] = err_ceiling as i64;
                floor + 1
            } else {
                errors[symbol] = err_floor as i64;
                floor
            }
        };

        alphabet.push(symbol as u8)?;
        sum_scaled_freq += scaled_freq as i64;
        *freq = scaled_freq as u32;
    }

    match alphabet.symbols() {
        [] => return Ok(0),
        [single] => {
            freqs[*single as usize] = scale;
            return Ok(1);
        }
        _ => {}
    }

    let scale = scale as i64;

    if sum_scaled_freq != scale {
        let delta = scale - sum_scaled_freq;

        if freqs[idx_max] as i64 > delta.abs() {
            trace!("Adjusting symbol {} by {} to reach scale {}", idx_max, delta, scale);
            freqs[idx_max] = (freqs[idx_max] as i64 + delta) as u32;
        } else {
            trace!("Spreading a correction of {} over {} symbols", delta, alphabet.len());
            sum_scaled_freq =
                spread_correction(freqs, &mut errors, alphabet.symbols(), sum_scaled_freq, scale);

            if sum_scaled_freq != scale {
                sum_scaled_freq =
                    sweep_correction(freqs, alphabet.symbols(), sum_scaled_freq, scale);
            }

            if sum_scaled_freq != scale {
                return Err(ModelError::InvalidArgument(format!(
                    "Cannot distribute {} symbols over a scale of {}",
                    alphabet.len(),
                    scale
                )));
            }
        }
    }

    Ok(alphabet.len())
}

/// Move the sum one unit at a time, always distorting the symbol with the
/// largest remaining rounding error. Returns the new sum.
fn spread_correction(
    freqs: &mut [u32; 256],
    errors: &mut [i64; 256],
    symbols: &[u8],
    mut sum_scaled_freq: i64,
    scale: i64,
) -> i64 {
    let inc: i64 = if sum_scaled_freq > scale { -1 } else { 1 };

    // Symbols at the quantum frequency or without rounding error stay out
    let mut queue: BinaryHeap<Candidate> = symbols
        .iter()
        .map(|&s| s as usize)
        .filter(|&s| errors[s] > 0 && freqs[s] as i64 != -inc)
        .map(|s| Candidate {
            error: errors[s],
            frequency: freqs[s],
            symbol: s as u8,
        })
        .collect();

    while sum_scaled_freq != scale {
        let Some(candidate) = queue.pop() else {
            break;
        };
        let s = candidate.symbol as usize;

        // Do not zero out any frequency
        if freqs[s] as i64 == -inc {
            continue;
        }

        freqs[s] = (freqs[s] as i64 + inc) as u32;
        errors[s] -= scale;
        sum_scaled_freq += inc;

        queue.push(Candidate {
            error: errors[s],
            frequency: freqs[s],
            symbol: candidate.symbol,
        });
    }

    sum_scaled_freq
}

/// Hand out whatever the heap could not absorb, one unit per symbol per pass,
/// largest frequencies first. Returns the new sum.
fn sweep_correction(
    freqs: &mut [u32; 256],
    symbols: &[u8],
    mut sum_scaled_freq: i64,
    scale: i64,
) -> i64 {
    let inc: i64 = if sum_scaled_freq > scale { -1 } else { 1 };
    let mut order = symbols.to_vec();
    order.sort_by(|&a, &b| freqs[b as usize].cmp(&freqs[a as usize]).then(b.cmp(&a)));

    while sum_scaled_freq != scale {
        let mut progressed = false;

        for &symbol in &order {
            if sum_scaled_freq == scale {
                break;
            }

            let s = symbol as usize;
            if inc < 0 && freqs[s] <= 1 {
                continue;
            }

            freqs[s] = (freqs[s] as i64 + inc) as u32;
            sum_scaled_freq += inc;
            progressed = true;
        }

        if !progressed {
            break;
        }
    }

    sum_scaled_freq
}

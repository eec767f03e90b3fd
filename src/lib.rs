//! # HLC Model
//!
//! Statistical model preparation for the order-0 entropy stage of the HLC
//! block compressor.
//!
//! ## Features
//!
//! - **Histograms and entropy**: order-0/order-1 byte counts and a fixed-point
//!   entropy estimate used to skip incompressible blocks
//! - **Frequency normalization**: rescales a histogram so that it sums to an
//!   exact scale, without starving any present symbol
//! - **Alphabet codec**: compact bit-level encoding of the set of present symbols
//! - **VarInt codec**: 7-bit group integers over a bit stream
//! - **Block models**: serialized per-block model headers, built in parallel
//!
//! ## Quick Start
//!
//! ```rust
//! use hlc_model::{normalize_frequencies, compute_histogram, Alphabet};
//!
//! let block = b"abracadabra";
//! let mut freqs = [0u32; 256];
//! compute_histogram(block, &mut freqs);
//!
//! let mut alphabet = Alphabet::bytes();
//! let size = normalize_frequencies(&mut freqs, &mut alphabet, block.len() as u32, 4096).unwrap();
//!
//! assert_eq!(size, 5);
//! assert_eq!(freqs.iter().sum::<u32>(), 4096);
//! ```
//!
//! ### Serializing an alphabet
//!
//! ```rust
//! use hlc_model::{decode_alphabet, encode_alphabet, Alphabet, BitReader, BitWriter};
//! use std::io::Cursor;
//!
//! let alphabet = Alphabet::from_symbols(&[3, 5, 9], 256).unwrap();
//! let mut writer = BitWriter::new(Vec::new());
//! encode_alphabet(&mut writer, &alphabet).unwrap();
//! let data = writer.close().unwrap();
//!
//! let mut decoded = Alphabet::bytes();
//! decode_alphabet(&mut BitReader::new(Cursor::new(data)), &mut decoded).unwrap();
//! assert_eq!(decoded, alphabet);
//! ```

pub mod alphabet;
pub mod analyzer;
pub mod bitstream;
pub mod cli;
pub mod config;
pub mod error;
pub mod histogram;
pub mod model;
pub mod normalize;
pub mod varint;

// Re-export commonly used types for convenience
pub use alphabet::{decode_alphabet, encode_alphabet, Alphabet, MAX_ALPHABET_SIZE};
pub use analyzer::{analyze, read_headers, AnalysisReport, BlockReport};
pub use bitstream::{BitReader, BitWriter, InputBitStream, OutputBitStream};
pub use config::{ModelConfig, ScalePreset};
pub use error::{ModelError, Result};
pub use histogram::{
    compute_histogram, compute_histogram_order1, first_order_entropy_1024, is_incompressible,
    log2_1024, Order1Histogram, INCOMPRESSIBLE_THRESHOLD,
};
pub use model::{FrequencyModel, ModelFlags};
pub use normalize::normalize_frequencies;
pub use varint::{read_var_int, write_var_int};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

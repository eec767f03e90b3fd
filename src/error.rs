use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid alphabet capacity: {0} (must be a power of 2)")]
    InvalidCapacity(usize),

    #[error("Alphabet too large: {0} (max alphabet length is 256)")]
    AlphabetTooLarge(usize),

    #[error("Invalid alphabet size parameter: {0} (must be less than or equal to 256)")]
    InvalidAlphabetSize(usize),

    #[error("Alphabet is full: capacity {0}")]
    AlphabetFull(usize),

    #[error("Symbol {symbol} is outside of an alphabet of capacity {capacity}")]
    SymbolOutOfRange { symbol: usize, capacity: usize },

    #[error("Invalid scale parameter: {0} (must be in [256..65536])")]
    InvalidScale(u32),

    #[error("Invalid bitstream: {0}")]
    InvalidBitstream(String),

    #[error("Unexpected end of bitstream after {0} bits")]
    UnexpectedEndOfStream(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

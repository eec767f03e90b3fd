//! Block-level model preparation over a whole buffer.
//!
//! The buffer is cut into fixed-size blocks whose models are built in
//! parallel. The headers are then serialized, in block order, into a single
//! bit stream:
//!
//! ```text
//! varint(block_count) model_header * block_count
//! ```

use crate::bitstream::{BitReader, BitWriter};
use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::histogram::first_order_entropy_1024;
use crate::model::FrequencyModel;
use crate::varint::{read_var_int, write_var_int, MAX_VAR_INT};
use indicatif::ProgressBar;
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::io::Cursor;

#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub index: usize,
    pub offset: u64,
    pub length: u32,
    pub entropy_1024: u32,
    pub stored: bool,
    pub alphabet_size: usize,
    pub header_bits: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub scale: u32,
    pub block_size: usize,
    pub total_bytes: u64,
    pub stored_blocks: usize,
    pub header_bytes: usize,
    pub blocks: Vec<BlockReport>,
    #[serde(skip)]
    models: Vec<FrequencyModel>,
    #[serde(skip)]
    headers: Vec<u8>,
}

impl AnalysisReport {
    pub fn models(&self) -> &[FrequencyModel] {
        &self.models
    }

    /// Serialized model headers of every block.
    pub fn headers(&self) -> &[u8] {
        &self.headers
    }
}

/// Build the model of every block of `data`.
pub fn analyze(data: &[u8], config: &ModelConfig) -> Result<AnalysisReport> {
    run(data, config, None)
}

/// Same as [`analyze`], advancing `progress` by the number of bytes processed.
pub fn analyze_with_progress(
    data: &[u8],
    config: &ModelConfig,
    progress: &ProgressBar,
) -> Result<AnalysisReport> {
    run(data, config, Some(progress))
}

fn run(
    data: &[u8],
    config: &ModelConfig,
    progress: Option<&ProgressBar>,
) -> Result<AnalysisReport> {
    config.validate()?;

    if config.block_size > MAX_VAR_INT as usize {
        return Err(ModelError::Config(format!(
            "Block size {} exceeds the maximum of {}",
            config.block_size, MAX_VAR_INT
        )));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| ModelError::Config(e.to_string()))?;

    let built: Vec<(u32, FrequencyModel)> = pool.install(|| {
        data.par_chunks(config.block_size)
            .map(|block| {
                let mut histo = [0u32; 256];
                let entropy = first_order_entropy_1024(block, &mut histo);
                let model = FrequencyModel::from_histogram(
                    histo,
                    block.len() as u32,
                    entropy,
                    config.scale,
                )?;
                if let Some(pb) = progress {
                    pb.inc(block.len() as u64);
                }
                Ok((entropy, model))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let block_count = u32::try_from(built.len())
        .ok()
        .filter(|&count| count <= MAX_VAR_INT)
        .ok_or_else(|| ModelError::Config(format!("Too many blocks: {}", built.len())))?;

    let mut writer = BitWriter::new(Vec::new());
    write_var_int(&mut writer, block_count)?;

    let mut blocks = Vec::with_capacity(built.len());
    let mut models = Vec::with_capacity(built.len());
    let mut offset = 0u64;

    for (index, (entropy, model)) in built.into_iter().enumerate() {
        let header_bits = model.write(&mut writer)?;
        blocks.push(BlockReport {
            index,
            offset,
            length: model.block_len(),
            entropy_1024: entropy,
            stored: model.is_stored(),
            alphabet_size: model.alphabet().len(),
            header_bits,
        });
        offset += model.block_len() as u64;
        models.push(model);
    }

    let headers = writer.close()?;
    let stored_blocks = blocks.iter().filter(|b| b.stored).count();
    debug!(
        "Analyzed {} blocks ({} stored), {} header bytes",
        blocks.len(),
        stored_blocks,
        headers.len()
    );

    Ok(AnalysisReport {
        scale: config.scale,
        block_size: config.block_size,
        total_bytes: data.len() as u64,
        stored_blocks,
        header_bytes: headers.len(),
        blocks,
        models,
        headers,
    })
}

/// Decode a header buffer produced by [`analyze`].
pub fn read_headers(headers: &[u8]) -> Result<Vec<FrequencyModel>> {
    let mut reader = BitReader::new(Cursor::new(headers));
    let count = read_var_int(&mut reader)? as usize;
    let mut models = Vec::with_capacity(count.min(headers.len()));

    for _ in 0..count {
        models.push(FrequencyModel::read(&mut reader)?);
    }

    Ok(models)
}

/// Build the models of `data`, decode their headers back and compare.
pub fn verify(data: &[u8], config: &ModelConfig) -> Result<bool> {
    let report = analyze(data, config)?;
    let decoded = read_headers(report.headers())?;
    Ok(decoded == report.models)
}

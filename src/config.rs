use crate::error::{ModelError, Result};
use std::str::FromStr;

/// Smallest accepted normalization scale.
pub const MIN_SCALE: u32 = 256;
/// Largest accepted normalization scale.
pub const MAX_SCALE: u32 = 1 << 16;

pub const DEFAULT_SCALE: u32 = 1 << 12;
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024; // 1 MiB

/// Probability resolution of the models handed to the entropy coder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePreset {
    Fast,
    Balanced,
    Max,
    Custom(u32),
}

impl ScalePreset {
    pub fn scale(self) -> u32 {
        match self {
            ScalePreset::Fast => DEFAULT_SCALE,
            ScalePreset::Balanced => 1 << 14,
            ScalePreset::Max => MAX_SCALE,
            ScalePreset::Custom(scale) => scale,
        }
    }
}

impl FromStr for ScalePreset {
    type Err = ModelError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(ScalePreset::Fast),
            "balanced" => Ok(ScalePreset::Balanced),
            "max" => Ok(ScalePreset::Max),
            other => {
                let scale: u32 = other
                    .parse()
                    .map_err(|_| ModelError::Config(format!("Invalid scale: {}", s)))?;
                if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
                    return Err(ModelError::InvalidScale(scale));
                }
                Ok(ScalePreset::Custom(scale))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub scale: u32,
    pub block_size: usize,
    pub threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            block_size: DEFAULT_BLOCK_SIZE,
            threads: num_cpus::get(),
        }
    }
}

impl ModelConfig {
    pub fn with_scale(mut self, preset: ScalePreset) -> Self {
        self.scale = preset.scale();
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Check the settings before any block is processed.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            return Err(ModelError::InvalidScale(self.scale));
        }
        if self.block_size == 0 {
            return Err(ModelError::Config("Block size must be greater than 0".to_string()));
        }
        if self.threads == 0 {
            return Err(ModelError::Config("Thread count must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_presets() {
        assert_eq!("fast".parse::<ScalePreset>().unwrap().scale(), 4096);
        assert_eq!("MAX".parse::<ScalePreset>().unwrap().scale(), 65536);
        assert_eq!("1000".parse::<ScalePreset>().unwrap(), ScalePreset::Custom(1000));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(matches!("255".parse::<ScalePreset>(), Err(ModelError::InvalidScale(255))));
        assert!(matches!("65537".parse::<ScalePreset>(), Err(ModelError::InvalidScale(65537))));
        assert!(matches!("huge".parse::<ScalePreset>(), Err(ModelError::Config(_))));
    }

    #[test]
    fn test_validate() {
        assert!(ModelConfig::default().validate().is_ok());
        assert!(ModelConfig::default().with_block_size(0).validate().is_err());
        assert!(ModelConfig::default().with_threads(0).validate().is_err());

        let mut config = ModelConfig::default();
        config.scale = 100;
        assert!(matches!(config.validate(), Err(ModelError::InvalidScale(100))));
    }
}

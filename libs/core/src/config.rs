use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ring capacity used when nothing else is configured
pub const DEFAULT_CAPACITY: usize = 8;

/// Largest ring a single channel may allocate
pub const MAX_CAPACITY: usize = 1 << 20;

/// Settings shared by every channel a coordinator creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeConfig {
    /// Number of bytes the ring buffer holds
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl PipeConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the ring capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check that the capacity is usable
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(
                "capacity must be at least 1 byte".to_string(),
            ));
        }
        if self.capacity > MAX_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "capacity {} exceeds the {} byte limit",
                self.capacity, MAX_CAPACITY
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_eight_bytes() {
        assert_eq!(PipeConfig::default().capacity, 8);
        let config = PipeConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipeConfig::default());
    }

    #[test]
    fn parses_capacity() {
        let config = PipeConfig::from_toml_str("capacity = 64").unwrap();
        assert_eq!(config.capacity, 64);
    }

    #[test]
    fn rejects_zero_and_oversized_capacity() {
        assert!(matches!(
            PipeConfig::from_toml_str("capacity = 0"),
            Err(Error::InvalidConfig(_))
        ));
        let huge = PipeConfig::default().with_capacity(MAX_CAPACITY + 1);
        assert!(matches!(huge.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn reports_malformed_toml() {
        assert!(matches!(
            PipeConfig::from_toml_str("capacity = \"eight\""),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = PipeConfig::load("/nonexistent/rendezvous-pipe.toml");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

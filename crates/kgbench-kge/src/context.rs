//! Read-only context handed to models by the host framework.
//!
//! Both structs are plain data: the host owns configuration loading and
//! dataset preparation, and passes the parts a model needs here.
//!
//! # Example
//!
//! ```rust
//! use kgbench_kge::{DatasetInfo, ModelConfig};
//!
//! let config = ModelConfig::default()
//!     .with_embedding_dim(64)
//!     .with_initialize_std(0.05);
//! let dataset = DatasetInfo::new(1000, 20);
//!
//! assert_eq!(config.complex_dim(), 32);
//! assert!(config.validate().is_ok());
//! assert!(dataset.validate().is_ok());
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default configuration key for ComplEx models.
pub const DEFAULT_CONFIGURATION_KEY: &str = "complex";

/// Model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Configuration key this block was read under (default: "complex").
    pub key: String,
    /// Real-valued embedding width, twice the complex dimension (default: 128).
    pub embedding_dim: usize,
    /// Standard deviation of the normal initializer (default: 0.1).
    pub initialize_std: f32,
    /// Random seed for initialization (default: 42).
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_CONFIGURATION_KEY.to_string(),
            embedding_dim: 128,
            initialize_std: 0.1,
            seed: 42,
        }
    }
}

impl ModelConfig {
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    pub fn with_initialize_std(mut self, std: f32) -> Self {
        self.initialize_std = std;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Copy of this configuration scoped under another key.
    pub fn for_key(&self, key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..self.clone()
        }
    }

    /// Number of complex components (`embedding_dim / 2`).
    pub fn complex_dim(&self) -> usize {
        self.embedding_dim / 2
    }

    /// Check invariants: non-empty key, positive even width, finite positive std.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::Validation("configuration key is empty".into()));
        }
        if self.embedding_dim == 0 {
            return Err(Error::Validation("embedding_dim must be positive".into()));
        }
        if self.embedding_dim % 2 != 0 {
            return Err(Error::OddDimension(self.embedding_dim));
        }
        if !self.initialize_std.is_finite() || self.initialize_std <= 0.0 {
            return Err(Error::Validation(format!(
                "initialize_std must be finite and positive, got {}",
                self.initialize_std
            )));
        }
        Ok(())
    }
}

/// Dataset handle: the vocabulary sizes a model needs to size its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Number of entities.
    pub num_entities: usize,
    /// Number of relations.
    pub num_relations: usize,
    /// Optional dataset name, for logging.
    #[serde(default)]
    pub name: Option<String>,
}

impl DatasetInfo {
    pub fn new(num_entities: usize, num_relations: usize) -> Self {
        Self {
            num_entities,
            num_relations,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_entities == 0 {
            return Err(Error::Validation("dataset has no entities".into()));
        }
        if self.num_relations == 0 {
            return Err(Error::Validation("dataset has no relations".into()));
        }
        Ok(())
    }
}

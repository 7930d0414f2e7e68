//! Trading symbol to Kite instrument token resolution.
//!
//! Follows the compile-time `include_str!` pattern used for the limits table:
//! the NIFTY 50 constituents ship in `seed_data/nifty50_instruments.yml`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for instrument registry operations.
#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("Failed to parse instruments YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate symbol in instruments file: {0}")]
    DuplicateSymbol(String),
    #[error("Symbol {0} not found in supported instruments")]
    UnknownSymbol(String),
}

/// Top-level structure for the instruments YAML file.
#[derive(Deserialize, Debug)]
pub struct InstrumentFile {
    pub exchange: String,
    pub instruments: Vec<InstrumentEntry>,
}

#[derive(Deserialize, Debug)]
pub struct InstrumentEntry {
    pub symbol: String,
    pub token: u64,
    pub name: String,
}

/// A tradable instrument known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub symbol: String,
    pub token: u64,
    pub name: String,
    pub exchange: String,
}

/// Case-insensitive symbol lookup.
#[derive(Debug, Clone, Default)]
pub struct Instruments {
    by_symbol: HashMap<String, Instrument>,
}

impl Instruments {
    /// The NIFTY 50 table embedded at compile time.
    pub fn nifty50() -> Result<Self, InstrumentError> {
        let yaml_content = include_str!("../../seed_data/nifty50_instruments.yml");
        Self::parse(yaml_content)
    }

    pub fn parse(yaml_content: &str) -> Result<Self, InstrumentError> {
        let file: InstrumentFile = serde_yml::from_str(yaml_content)?;

        let mut by_symbol = HashMap::new();
        for entry in file.instruments {
            let key = entry.symbol.trim().to_uppercase();
            if by_symbol.contains_key(&key) {
                return Err(InstrumentError::DuplicateSymbol(key));
            }
            by_symbol.insert(
                key.clone(),
                Instrument {
                    symbol: key,
                    token: entry.token,
                    name: entry.name,
                    exchange: file.exchange.clone(),
                },
            );
        }
        Ok(Self { by_symbol })
    }

    pub fn resolve(&self, symbol: &str) -> Result<&Instrument, InstrumentError> {
        self.by_symbol
            .get(&symbol.trim().to_uppercase())
            .ok_or_else(|| InstrumentError::UnknownSymbol(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.resolve(symbol).is_ok()
    }

    /// All instruments sorted by symbol.
    pub fn sorted(&self) -> Vec<&Instrument> {
        let mut all: Vec<&Instrument> = self.by_symbol.values().collect();
        all.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        all
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

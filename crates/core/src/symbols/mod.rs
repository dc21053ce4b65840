use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{RhythmError, Result};

/// Ordered symbols assigned to notes in a repeating cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSequence {
    values: Vec<String>,
}

impl SymbolSequence {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Flattens a comma separated table in row-major order. Cells are trimmed
    /// and blank cells are skipped, so trailing newlines and `\r\n` endings
    /// never produce empty symbols.
    pub fn parse(text: &str) -> Self {
        let values = text
            .split('\n')
            .flat_map(|row| row.split(','))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect();
        Self { values }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Index-based view over a non-empty [`SymbolSequence`].
#[derive(Debug, Clone, Copy)]
pub struct SymbolCycler<'a> {
    values: &'a [String],
}

impl<'a> SymbolCycler<'a> {
    pub fn new(sequence: &'a SymbolSequence) -> Result<Self> {
        if sequence.is_empty() {
            return Err(RhythmError::EmptySequence);
        }
        Ok(Self {
            values: sequence.values(),
        })
    }

    /// Returns `sequence[index mod len]`.
    pub fn symbol_at(&self, index: usize) -> &'a str {
        &self.values[index % self.values.len()]
    }
}

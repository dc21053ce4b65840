use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{RhythmError, Result};

/// Playable note configuration: the symbol a note shows and the lane whose
/// key judges it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAsset {
    pub symbol: String,
    pub lane: usize,
}

/// Registry of every symbol that can be spawned, indexed by lane.
#[derive(Debug, Default, Clone)]
pub struct NoteCatalog {
    lanes: Vec<NoteAsset>,
    by_symbol: HashMap<String, usize>,
}

impl NoteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog where lane `k` expects `lanes[k]`.
    pub fn from_lanes<I, S>(lanes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        for symbol in lanes {
            catalog.register(symbol);
        }
        catalog
    }

    /// Appends a lane for `symbol` and returns its index. Registering a symbol
    /// twice returns the existing lane.
    pub fn register(&mut self, symbol: impl Into<String>) -> usize {
        let symbol = symbol.into();
        if let Some(&lane) = self.by_symbol.get(&symbol) {
            return lane;
        }
        let lane = self.lanes.len();
        self.by_symbol.insert(symbol.clone(), lane);
        self.lanes.push(NoteAsset { symbol, lane });
        lane
    }

    /// Looks up the configuration for a scheduled symbol.
    pub fn resolve(&self, symbol: &str) -> Result<&NoteAsset> {
        self.by_symbol
            .get(symbol)
            .map(|&lane| &self.lanes[lane])
            .ok_or_else(|| RhythmError::UnknownSymbol(symbol.to_string()))
    }

    /// Symbol expected when the key for `lane` is pressed.
    pub fn lane_symbol(&self, lane: usize) -> Option<&str> {
        self.lanes.get(lane).map(|asset| asset.symbol.as_str())
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn assets(&self) -> &[NoteAsset] {
        &self.lanes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_symbols() {
        let catalog = NoteCatalog::from_lanes(["A", "B", "C"]);

        assert_eq!(catalog.resolve("B").unwrap().lane, 1);
        assert_eq!(catalog.lane_symbol(2), Some("C"));
        assert_eq!(catalog.lane_symbol(3), None);
    }

    #[test]
    fn errors_on_unknown_symbols() {
        let catalog = NoteCatalog::from_lanes(["A"]);

        let err = catalog.resolve("Z").unwrap_err();
        assert!(matches!(err, RhythmError::UnknownSymbol(_)));
        assert!(format!("{err}").contains("`Z`"));
    }

    #[test]
    fn duplicate_registration_keeps_first_lane() {
        let mut catalog = NoteCatalog::new();
        assert_eq!(catalog.register("A"), 0);
        assert_eq!(catalog.register("B"), 1);
        assert_eq!(catalog.register("A"), 0);
        assert_eq!(catalog.lane_count(), 2);
    }
}

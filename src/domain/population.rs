// Population reference table
use std::collections::HashMap;

/// Entity name to resident population. Unknown names have no population.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    entries: HashMap<String, u64>,
}

impl PopulationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, population: u64) {
        self.entries.insert(name.into(), population);
    }

    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for PopulationTable {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, population) in iter {
            table.insert(name, population);
        }
        table
    }
}

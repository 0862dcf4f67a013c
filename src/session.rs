//! Per-run state shared by the namers and the replacement engine.

use crate::config::Settings;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};

pub const COLORS: &str = "colors";

/// Category → canonical value → token name, as found in the Tailwind config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value → name` unless the value already has a name.
    pub fn insert(&mut self, category: &str, value: &str, name: &str) -> bool {
        let values = self.categories.entry(category.to_string()).or_default();
        if values.contains_key(value) {
            return false;
        }
        values.insert(value.to_string(), name.to_string());
        true
    }

    pub fn name_of(&self, category: &str, value: &str) -> Option<&str> {
        self.categories
            .get(category)
            .and_then(|values| values.get(value))
            .map(String::as_str)
    }

    pub fn contains(&self, category: &str, value: &str) -> bool {
        self.name_of(category, value).is_some()
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.categories
            .iter()
            .map(|(category, values)| (category.as_str(), values))
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Names already taken per category. Only ever grows during a run.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: BTreeMap<String, BTreeSet<String>>,
}

impl NameRegistry {
    pub fn reserve(&mut self, category: &str, name: &str) {
        self.names
            .entry(category.to_string())
            .or_default()
            .insert(name.to_string());
    }

    pub fn contains(&self, category: &str, name: &str) -> bool {
        self.names
            .get(category)
            .is_some_and(|names| names.contains(name))
    }

    /// Takes `base`, or the first free `base-1`, `base-2`, ...
    pub fn claim(&mut self, category: &str, base: &str) -> String {
        let mut name = base.to_string();
        let mut counter = 1usize;
        while self.contains(category, &name) {
            name = format!("{base}-{counter}");
            counter += 1;
        }
        self.reserve(category, &name);
        name
    }
}

/// Values met during the scan with their assigned names, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Discovered {
    categories: IndexMap<String, IndexMap<String, String>>,
}

impl Discovered {
    pub fn name_of(&self, category: &str, value: &str) -> Option<&str> {
        self.categories
            .get(category)
            .and_then(|values| values.get(value))
            .map(String::as_str)
    }

    pub fn record(&mut self, category: &str, value: &str, name: &str) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .entry(value.to_string())
            .or_insert_with(|| name.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, String>)> {
        self.categories
            .iter()
            .map(|(category, values)| (category.as_str(), values))
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Category → token name → config value, for entries the config lacks.
pub type Additions = IndexMap<String, IndexMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub processed_files: usize,
    pub modified_files: usize,
    pub replacements: usize,
    pub color_config_matches: usize,
    pub catalog_exact_matches: usize,
    pub catalog_nearest_matches: usize,
    pub offline_matches: usize,
    pub value_config_matches: usize,
    pub generated_names: usize,
    pub unresolved_colors: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    pub tokens: TokenTable,
    pub registry: NameRegistry,
    pub discovered: Discovered,
    pub stats: Stats,
}

impl Session {
    pub fn new(settings: Settings, tokens: TokenTable) -> Self {
        let mut registry = NameRegistry::default();
        for (category, values) in tokens.categories() {
            for name in values.values() {
                registry.reserve(category, name);
            }
        }
        Self {
            settings,
            tokens,
            registry,
            discovered: Discovered::default(),
            stats: Stats::default(),
        }
    }

    /// Keys present in the config whose values could not be indexed still
    /// block generated names.
    pub fn reserve_names<'a>(&mut self, category: &str, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.registry.reserve(category, name);
        }
    }

    /// Discovered values that the loaded config does not already name.
    pub fn additions(&self) -> Additions {
        let mut additions = Additions::new();
        for (category, values) in self.discovered.iter() {
            for (value, name) in values {
                if self.tokens.contains(category, value) {
                    continue;
                }
                let stored = if category == COLORS {
                    format!("#{value}")
                } else {
                    value.clone()
                };
                additions
                    .entry(category.to_string())
                    .or_default()
                    .insert(name.clone(), stored);
            }
        }
        additions
    }
}

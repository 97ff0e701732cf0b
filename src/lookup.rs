//! Action lookup over a scraped catalog
//!
//! Indexes every action by its qualified name (`s3:GetObject`) and groups
//! names by service prefix, so editors and policy linters can resolve an
//! action or expand a wildcard such as `s3:Get*`.

use crate::catalog::{ActionRecord, Catalog};
use crate::writer::read_catalog;
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

/// Qualified action name -> record, plus prefix -> qualified names
#[derive(Debug, Clone, Default)]
pub struct ActionIndex {
    actions: BTreeMap<String, ActionRecord>,
    by_prefix: BTreeMap<String, Vec<String>>,
}

impl ActionIndex {
    /// Index every action of every service. Services without a prefix are
    /// reachable by exact name only.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut index = Self::default();

        for service in catalog.values() {
            for record in service.actions.values() {
                index
                    .actions
                    .insert(record.action_name.clone(), record.clone());

                if let Some(prefix) = &service.service_prefix {
                    index
                        .by_prefix
                        .entry(prefix.clone())
                        .or_default()
                        .push(record.action_name.clone());
                }
            }
        }

        index
    }

    /// Load and index a catalog file written by the scraper
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_catalog(&read_catalog(path)?))
    }

    /// Look up an action by qualified name, e.g. `s3:GetObject`
    pub fn get(&self, action: &str) -> Option<&ActionRecord> {
        self.actions.get(action)
    }

    /// Qualified names matching `prefix:pattern`, where `*` in the pattern
    /// matches any run of characters. Unknown prefixes and patterns without
    /// a `:` match nothing.
    pub fn matching(&self, wildcard: &str) -> Vec<&str> {
        let Some((prefix, pattern)) = wildcard.split_once(':') else {
            return Vec::new();
        };
        let Some(names) = self.by_prefix.get(prefix) else {
            return Vec::new();
        };
        let Some(re) = wildcard_regex(pattern) else {
            return Vec::new();
        };

        names
            .iter()
            .filter(|name| {
                name.split_once(':')
                    .is_some_and(|(_, action)| re.is_match(action))
            })
            .map(String::as_str)
            .collect()
    }

    /// All qualified action names, sorted
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of distinct service prefixes
    pub fn prefix_count(&self) -> usize {
        self.by_prefix.len()
    }
}

fn wildcard_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body)).ok()
}

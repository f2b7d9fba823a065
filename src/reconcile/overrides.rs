use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Operator-curated equivalence between a panier label and a Parcoursup label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideRule {
    #[serde(alias = "etudiantType")]
    pub source_label: String,
    #[serde(alias = "parcoursupFiliere")]
    pub target_label: String,
    #[serde(default, alias = "schoolUai")]
    pub institution: Option<String>,
}

impl OverrideRule {
    pub fn global(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_label: source.into(),
            target_label: target.into(),
            institution: None,
        }
    }

    pub fn scoped(
        source: impl Into<String>,
        target: impl Into<String>,
        institution: impl Into<String>,
    ) -> Self {
        Self {
            source_label: source.into(),
            target_label: target.into(),
            institution: Some(institution.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OverrideScope {
    Institution,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideHit<'a> {
    pub scope: OverrideScope,
    pub targets: &'a BTreeSet<String>,
}

/// Override rules indexed by source label, split into institution-scoped
/// and global tiers.
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    scoped: BTreeMap<(String, String), BTreeSet<String>>,
    global: BTreeMap<String, BTreeSet<String>>,
    rule_count: usize,
}

impl OverrideStore {
    pub fn new(rules: impl IntoIterator<Item = OverrideRule>) -> Self {
        let mut store = Self::default();
        for rule in rules {
            store.insert(rule);
        }
        store
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading override rules: {}", path.display()))?;
        let rules: Vec<OverrideRule> = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing override rules: {}", path.display()))?;
        Ok(Self::new(rules))
    }

    fn insert(&mut self, rule: OverrideRule) {
        if rule.source_label.is_empty() || rule.target_label.is_empty() {
            warn!(
                "skipping override rule with empty label: {:?} -> {:?}",
                rule.source_label, rule.target_label
            );
            return;
        }
        let inserted = match rule.institution.filter(|code| !code.trim().is_empty()) {
            Some(code) => self
                .scoped
                .entry((code, rule.source_label))
                .or_default()
                .insert(rule.target_label),
            None => self
                .global
                .entry(rule.source_label)
                .or_default()
                .insert(rule.target_label),
        };
        if inserted {
            self.rule_count += 1;
        }
    }

    /// Institution-scoped rules for `label` shadow global ones entirely.
    pub fn lookup(&self, label: &str, institution: Option<&str>) -> Option<OverrideHit<'_>> {
        if let Some(code) = institution {
            let key = (code.to_string(), label.to_string());
            if let Some(targets) = self.scoped.get(&key) {
                return Some(OverrideHit {
                    scope: OverrideScope::Institution,
                    targets,
                });
            }
        }
        self.global.get(label).map(|targets| OverrideHit {
            scope: OverrideScope::Global,
            targets,
        })
    }

    pub fn len(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Two baccalauréat specialties, stored in lexicographic order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecialtyPair {
    first: String,
    second: String,
}

impl SpecialtyPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

/// Admission statistic for one specialty pair and one program category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialtyRate {
    #[serde(alias = "specialty1Id")]
    pub specialty_1: String,
    #[serde(alias = "specialty2Id")]
    pub specialty_2: String,
    #[serde(alias = "cpgeCategory")]
    pub category: String,
    #[serde(default, alias = "admissionRatePct")]
    pub admission_rate_pct: Option<f64>,
    #[serde(default, alias = "candidats")]
    pub candidates: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct SpecialtyAdmissionTable {
    rates: BTreeMap<(SpecialtyPair, String), SpecialtyRate>,
}

impl SpecialtyAdmissionTable {
    pub fn new(rows: impl IntoIterator<Item = SpecialtyRate>) -> Self {
        let rates = rows
            .into_iter()
            .map(|row| {
                let key = (
                    SpecialtyPair::new(row.specialty_1.clone(), row.specialty_2.clone()),
                    row.category.clone(),
                );
                (key, row)
            })
            .collect();
        Self { rates }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading specialty rates: {}", path.display()))?;
        let rows: Vec<SpecialtyRate> = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing specialty rates: {}", path.display()))?;
        Ok(Self::new(rows))
    }

    pub fn get(&self, pair: &SpecialtyPair, category: &str) -> Option<&SpecialtyRate> {
        self.rates.get(&(pair.clone(), category.to_string()))
    }

    /// Usable admission percentage for the pair in `category`, if any.
    pub fn rate_for(&self, pair: &SpecialtyPair, category: &str) -> Option<f64> {
        self.get(pair, category)
            .and_then(|row| row.admission_rate_pct)
            .filter(|pct| pct.is_finite())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

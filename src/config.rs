use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audit::auditor::DEFAULT_AGGREGATE_CATEGORY;
use crate::audit::AuditScope;
use crate::output::OutputFormat;
use crate::scoring::SpecialtyPair;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_overrides_path")]
    pub overrides_path: String,
    #[serde(default = "default_specialty_rates_path")]
    pub specialty_rates_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_aggregate_category")]
    pub aggregate_category: String,
    #[serde(default)]
    pub label_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_student_grade")]
    pub default_student_grade: f64,
    #[serde(default = "default_specialty_pair")]
    pub specialty_pair: [String; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub overrides_path: Option<PathBuf>,
    pub specialty_rates_path: Option<PathBuf>,
    pub label_filter: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/admission-oracle/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(path) = overrides.catalog_path {
            self.data.catalog_path = path.display().to_string();
        }
        if let Some(path) = overrides.overrides_path {
            self.data.overrides_path = path.display().to_string();
        }
        if let Some(path) = overrides.specialty_rates_path {
            self.data.specialty_rates_path = path.display().to_string();
        }
        if let Some(filter) = overrides.label_filter {
            self.audit.label_filter = filter;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn catalog_path(&self) -> PathBuf {
        expand_tilde(&self.data.catalog_path)
    }

    pub fn overrides_path(&self) -> PathBuf {
        expand_tilde(&self.data.overrides_path)
    }

    pub fn specialty_rates_path(&self) -> PathBuf {
        expand_tilde(&self.data.specialty_rates_path)
    }

    pub fn audit_scope(&self) -> AuditScope {
        AuditScope {
            aggregate_category: self.audit.aggregate_category.clone(),
            label_filter: None,
        }
        .with_label_filter(Some(self.audit.label_filter.clone()))
    }

    pub fn specialty_pair(&self) -> SpecialtyPair {
        let [a, b] = &self.scoring.specialty_pair;
        SpecialtyPair::new(a.clone(), b.clone())
    }

    pub fn default_template() -> String {
        let template = r#"[data]
# JSON snapshot exported by the ingestion pipeline
catalog_path = "~/.local/share/admission-oracle/catalog.json"
# JSON array of {"etudiantType", "parcoursupFiliere", "schoolUai"} rules
overrides_path = "~/.local/share/admission-oracle/overrides.json"
specialty_rates_path = "~/.local/share/admission-oracle/specialty_rates.json"

[audit]
# Parcoursup aggregated category holding the preparatory classes
aggregate_category = "CPGE"
# Only audit panier labels containing this text (empty = all)
label_filter = ""

[scoring]
default_student_grade = 15.0
specialty_pair = ["maths", "physique-chimie"]

[watch]
interval_secs = 60

[output]
format = "table"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            overrides_path: default_overrides_path(),
            specialty_rates_path: default_specialty_rates_path(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            aggregate_category: default_aggregate_category(),
            label_filter: String::new(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_student_grade: default_student_grade(),
            specialty_pair: default_specialty_pair(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_catalog_path() -> String {
    "~/.local/share/admission-oracle/catalog.json".to_string()
}

fn default_overrides_path() -> String {
    "~/.local/share/admission-oracle/overrides.json".to_string()
}

fn default_specialty_rates_path() -> String {
    "~/.local/share/admission-oracle/specialty_rates.json".to_string()
}

fn default_aggregate_category() -> String {
    DEFAULT_AGGREGATE_CATEGORY.to_string()
}

fn default_student_grade() -> f64 {
    15.0
}

fn default_specialty_pair() -> [String; 2] {
    ["maths".to_string(), "physique-chimie".to_string()]
}

fn default_interval_secs() -> u64 {
    60
}

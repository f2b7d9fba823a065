pub mod index;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use index::{CatalogIndex, InstitutionLabels};

/// Read-only snapshot of everything the ingestion pipeline produced.
///
/// Taxonomy A is the Parcoursup side (`formations`), taxonomy B the panier
/// side (`paniers` + `panier_stats`). The two are only linked through the
/// institution code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub institutions: Vec<Institution>,
    #[serde(default)]
    pub formations: Vec<Formation>,
    #[serde(default)]
    pub paniers: Vec<Panier>,
    #[serde(default)]
    pub panier_stats: Vec<PanierSchoolStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Institution {
    #[serde(alias = "uai")]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

/// Parcoursup program record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Formation {
    #[serde(alias = "schoolUai")]
    pub institution: String,
    /// Aggregated category, e.g. "CPGE" or "Licence".
    pub category: String,
    #[serde(default, alias = "filiereFormationDetaillee")]
    pub filiere_detaillee: Option<String>,
    #[serde(default, alias = "filiereFormationDetailleeBis")]
    pub filiere_bis: Option<String>,
    #[serde(default, alias = "admissionRate")]
    pub admission_rate_pct: Option<f64>,
    #[serde(default, alias = "mentionDistribution")]
    pub mention_distribution: Option<MentionDistribution>,
}

/// Historical-statistics grouping from the third-party provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Panier {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "cpgeType")]
    pub cpge_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanierSchoolStats {
    #[serde(alias = "panierId")]
    pub panier_id: String,
    #[serde(alias = "schoolUai")]
    pub institution: String,
    #[serde(default, alias = "moyenneBac")]
    pub moyenne_bac: Option<f64>,
    #[serde(default, alias = "tauxIntegrationPct")]
    pub taux_integration_pct: Option<f64>,
    #[serde(default, alias = "moyenneMultiAnsPct")]
    pub moyenne_multi_ans_pct: Option<f64>,
}

/// Counts (or shares) of admitted students per baccalauréat honours level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MentionDistribution {
    #[serde(default, alias = "SansMention")]
    pub sans_mention: f64,
    #[serde(default, alias = "AB")]
    pub assez_bien: f64,
    #[serde(default, alias = "B")]
    pub bien: f64,
    #[serde(default, alias = "TB")]
    pub tres_bien: f64,
    #[serde(default, alias = "Felicitations")]
    pub felicitations: f64,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading catalog: {}", path.display()))?;
        let parsed: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing catalog JSON: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn institution(&self, code: &str) -> Option<&Institution> {
        self.institutions.iter().find(|i| i.code == code)
    }

    pub fn panier(&self, id: &str) -> Option<&Panier> {
        self.paniers.iter().find(|p| p.id == id)
    }

    /// Panier statistics rows whose panier carries exactly `cpge_type`.
    pub fn stats_for_type<'a>(
        &'a self,
        cpge_type: &'a str,
    ) -> impl Iterator<Item = (&'a Panier, &'a PanierSchoolStats)> + 'a {
        self.panier_stats.iter().filter_map(move |stat| {
            self.panier(&stat.panier_id)
                .filter(|p| p.cpge_type == cpge_type)
                .map(|p| (p, stat))
        })
    }
}

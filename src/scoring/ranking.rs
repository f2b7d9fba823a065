use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::scoring::{
    classify_grade_gap, estimate_grade, score, AdmissionScore, GradeGap,
    SpecialtyAdmissionTable, SpecialtyPair,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramCandidate {
    pub institution: String,
    pub institution_name: String,
    pub label: String,
    pub program_grade: Option<f64>,
    pub specialty_rate_pct: Option<f64>,
    /// Published outcome for the program: panier integration rate or
    /// Parcoursup admission rate. Shown only, never scored.
    #[serde(default)]
    pub published_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedProgram {
    pub rank: usize,
    pub candidate: ProgramCandidate,
    pub score: AdmissionScore,
    pub grade_gap: GradeGap,
}

/// Scores each candidate and orders them best-first; ties go to the lower
/// institution code.
pub fn rank_programs(student_grade: f64, candidates: Vec<ProgramCandidate>) -> Vec<RankedProgram> {
    let mut ranked: Vec<RankedProgram> = candidates
        .into_iter()
        .map(|candidate| RankedProgram {
            rank: 0,
            score: score(
                student_grade,
                candidate.program_grade,
                candidate.specialty_rate_pct,
            ),
            grade_gap: classify_grade_gap(student_grade, candidate.program_grade),
            candidate,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .combined_score
            .total_cmp(&a.score.combined_score)
            .then_with(|| a.candidate.institution.cmp(&b.candidate.institution))
    });
    for (idx, item) in ranked.iter_mut().enumerate() {
        item.rank = idx + 1;
    }
    ranked
}

/// One candidate per institution publishing statistics for `cpge_type`,
/// using the panier's historical baccalauréat average as program grade.
pub fn panier_candidates(
    catalog: &Catalog,
    cpge_type: &str,
    rates: &SpecialtyAdmissionTable,
    pair: &SpecialtyPair,
) -> Vec<ProgramCandidate> {
    let specialty_rate_pct = rates.rate_for(pair, cpge_type);
    let mut candidates: Vec<ProgramCandidate> = Vec::new();
    for (panier, stat) in catalog.stats_for_type(cpge_type) {
        if candidates.iter().any(|c| c.institution == stat.institution) {
            continue;
        }
        candidates.push(ProgramCandidate {
            institution: stat.institution.clone(),
            institution_name: catalog
                .institution(&stat.institution)
                .map(|i| i.name.clone())
                .unwrap_or_default(),
            label: panier.cpge_type.clone(),
            program_grade: stat.moyenne_bac,
            specialty_rate_pct,
            published_rate_pct: stat.taux_integration_pct.or(stat.moyenne_multi_ans_pct),
        });
    }
    candidates
}

/// One candidate per (institution, program) among Parcoursup formations whose
/// category contains `category`, optionally narrowed to one detailed program.
/// The program grade is estimated from the honours distribution of admitted
/// students; the specialty rate is looked up under the program label.
pub fn formation_candidates(
    catalog: &Catalog,
    category: &str,
    program: Option<&str>,
    rates: &SpecialtyAdmissionTable,
    pair: &SpecialtyPair,
) -> Vec<ProgramCandidate> {
    let mut candidates: Vec<ProgramCandidate> = Vec::new();
    for formation in catalog
        .formations
        .iter()
        .filter(|f| f.category.contains(category))
    {
        let Some(label) = formation
            .filiere_detaillee
            .as_deref()
            .or(formation.filiere_bis.as_deref())
            .filter(|l| !l.is_empty())
        else {
            continue;
        };
        if program.is_some_and(|wanted| wanted != label) {
            continue;
        }
        if candidates
            .iter()
            .any(|c| c.institution == formation.institution && c.label == label)
        {
            continue;
        }
        candidates.push(ProgramCandidate {
            institution: formation.institution.clone(),
            institution_name: catalog
                .institution(&formation.institution)
                .map(|i| i.name.clone())
                .unwrap_or_default(),
            label: label.to_string(),
            program_grade: formation.mention_distribution.as_ref().and_then(estimate_grade),
            specialty_rate_pct: rates.rate_for(pair, label),
            published_rate_pct: formation.admission_rate_pct,
        });
    }
    candidates
}

use serde::{Deserialize, Serialize};

use crate::scoring::{
    grade_score, AdmissionScore, RiskBand, FALLBACK_PROGRAM_GRADE, FALLBACK_SPECIALTY_RATE_PCT,
    GRADE_WEIGHT, SPECIALTY_WEIGHT,
};

/// Combined admission-likelihood score. Total: missing or non-finite
/// statistics fall back to the neutral constants instead of failing. A
/// program grade of zero or below means "not published".
pub fn score(
    student_grade: f64,
    program_grade: Option<f64>,
    specialty_rate_pct: Option<f64>,
) -> AdmissionScore {
    let program_grade = published_grade(program_grade);
    let used_fallback_grade = program_grade.is_none();
    let effective_grade = program_grade.unwrap_or(FALLBACK_PROGRAM_GRADE);
    let grade_diff = student_grade - effective_grade;
    let grade_score = grade_score(grade_diff);

    let specialty_rate_pct = specialty_rate_pct.filter(|r| r.is_finite());
    let used_fallback_specialty = specialty_rate_pct.is_none();
    let specialty_score = specialty_rate_pct
        .map(|r| r.clamp(0.0, 100.0))
        .unwrap_or(FALLBACK_SPECIALTY_RATE_PCT);

    let combined_score =
        (GRADE_WEIGHT * grade_score + SPECIALTY_WEIGHT * specialty_score).clamp(0.0, 100.0);

    AdmissionScore {
        combined_score,
        grade_score,
        specialty_score,
        grade_diff,
        used_fallback_grade,
        used_fallback_specialty,
        band: RiskBand::from_score(combined_score),
    }
}

/// Colour hint used where only the grade signal is available.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GradeGap {
    Comfortable,
    Reach,
    Stretch,
    Unknown,
}

pub fn classify_grade_gap(student_grade: f64, program_grade: Option<f64>) -> GradeGap {
    let Some(program_grade) = published_grade(program_grade) else {
        return GradeGap::Unknown;
    };
    let diff = student_grade - program_grade;
    if diff >= -0.5 {
        GradeGap::Comfortable
    } else if diff >= -1.0 {
        GradeGap::Reach
    } else {
        GradeGap::Stretch
    }
}

fn published_grade(program_grade: Option<f64>) -> Option<f64> {
    program_grade.filter(|g| g.is_finite() && *g > 0.0)
}

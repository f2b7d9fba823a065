//! Admission-likelihood scoring.
//!
//! A student's grade is compared to a program's historical grade through a
//! fixed piecewise-linear table, then blended 50/50 with the admission rate
//! observed for the student's specialty pair.

pub mod interpolate;
pub mod mention;
pub mod ranking;
pub mod scorer;
pub mod specialty;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use interpolate::{grade_score, GRADE_ANCHORS};
pub use mention::estimate_grade;
pub use ranking::{rank_programs, ProgramCandidate, RankedProgram};
pub use scorer::{classify_grade_gap, score, GradeGap};
pub use specialty::{SpecialtyAdmissionTable, SpecialtyPair, SpecialtyRate};

/// Program grade assumed when no historical statistic exists.
pub const FALLBACK_PROGRAM_GRADE: f64 = 15.0;
/// Specialty admission rate assumed when the pair has no statistic.
pub const FALLBACK_SPECIALTY_RATE_PCT: f64 = 50.0;
pub const GRADE_WEIGHT: f64 = 0.5;
pub const SPECIALTY_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AdmissionScore {
    pub combined_score: f64,
    pub grade_score: f64,
    pub specialty_score: f64,
    pub grade_diff: f64,
    pub used_fallback_grade: bool,
    pub used_fallback_specialty: bool,
    pub band: RiskBand,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Unfavorable,
    BorderlineUnfavorable,
    BorderlineFavorable,
    Favorable,
    VeryFavorable,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            Self::VeryFavorable
        } else if score > 60.0 {
            Self::Favorable
        } else if score > 50.0 {
            Self::BorderlineFavorable
        } else if score > 40.0 {
            Self::BorderlineUnfavorable
        } else {
            Self::Unfavorable
        }
    }

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Unfavorable => "unfavorable",
            Self::BorderlineUnfavorable => "borderline_unfavorable",
            Self::BorderlineFavorable => "borderline_favorable",
            Self::Favorable => "favorable",
            Self::VeryFavorable => "very_favorable",
        }
    }
}

impl Display for RiskBand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Unfavorable => "Unfavorable",
            Self::BorderlineUnfavorable => "Borderline (unfavorable)",
            Self::BorderlineFavorable => "Borderline (favorable)",
            Self::Favorable => "Favorable",
            Self::VeryFavorable => "Very favorable",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown risk band: {0}")]
pub struct RiskBandParseError(pub String);

impl FromStr for RiskBand {
    type Err = RiskBandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "unfavorable" => Ok(Self::Unfavorable),
            "borderline_unfavorable" => Ok(Self::BorderlineUnfavorable),
            "borderline_favorable" | "borderline" => Ok(Self::BorderlineFavorable),
            "favorable" => Ok(Self::Favorable),
            "very_favorable" => Ok(Self::VeryFavorable),
            _ => Err(RiskBandParseError(s.to_string())),
        }
    }
}

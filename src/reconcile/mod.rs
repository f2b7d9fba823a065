pub mod overrides;
pub mod resolver;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use overrides::{OverrideHit, OverrideRule, OverrideScope, OverrideStore};
pub use resolver::resolve;

/// How a panier label was matched against an institution's Parcoursup labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    ExactMatch {
        target: String,
    },
    ResolvedByOverride {
        scope: OverrideScope,
        targets: BTreeSet<String>,
        matched: BTreeSet<String>,
    },
    /// Substring match with no override backing it. Always needs review.
    ResolvedByHeuristic {
        target: String,
    },
    Unresolved {
        reason: UnresolvedReason,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// An override applies but the institution offers none of its targets.
    OverrideTargetMissing {
        scope: OverrideScope,
        targets: BTreeSet<String>,
    },
    NoMatch,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    ExactMatch,
    ResolvedByOverride,
    ResolvedByHeuristic,
    Unresolved,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    None,
    Low,
    High,
}

impl ResolutionOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::ExactMatch { .. } => OutcomeKind::ExactMatch,
            Self::ResolvedByOverride { .. } => OutcomeKind::ResolvedByOverride,
            Self::ResolvedByHeuristic { .. } => OutcomeKind::ResolvedByHeuristic,
            Self::Unresolved { .. } => OutcomeKind::Unresolved,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self.kind() {
            OutcomeKind::ExactMatch | OutcomeKind::ResolvedByOverride => Confidence::High,
            OutcomeKind::ResolvedByHeuristic => Confidence::Low,
            OutcomeKind::Unresolved => Confidence::None,
        }
    }

    pub fn needs_review(&self) -> bool {
        self.confidence() != Confidence::High
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved { .. })
    }

    /// Labels the resolver matched, or attempted to match for diagnostics.
    pub fn targets(&self) -> BTreeSet<String> {
        match self {
            Self::ExactMatch { target } | Self::ResolvedByHeuristic { target } => {
                BTreeSet::from([target.clone()])
            }
            Self::ResolvedByOverride { targets, .. } => targets.clone(),
            Self::Unresolved {
                reason: UnresolvedReason::OverrideTargetMissing { targets, .. },
            } => targets.clone(),
            Self::Unresolved {
                reason: UnresolvedReason::NoMatch,
            } => BTreeSet::new(),
        }
    }
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 4] = [
        OutcomeKind::ExactMatch,
        OutcomeKind::ResolvedByOverride,
        OutcomeKind::ResolvedByHeuristic,
        OutcomeKind::Unresolved,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::ExactMatch => "exact_match",
            Self::ResolvedByOverride => "resolved_by_override",
            Self::ResolvedByHeuristic => "resolved_by_heuristic",
            Self::Unresolved => "unresolved",
        }
    }
}

impl Display for OutcomeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

#[derive(Debug, Error)]
#[error("unknown resolution outcome: {0}")]
pub struct OutcomeKindParseError(pub String);

impl FromStr for OutcomeKind {
    type Err = OutcomeKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "exact_match" | "exact" => Ok(Self::ExactMatch),
            "resolved_by_override" | "override" => Ok(Self::ResolvedByOverride),
            "resolved_by_heuristic" | "heuristic" => Ok(Self::ResolvedByHeuristic),
            "unresolved" => Ok(Self::Unresolved),
            _ => Err(OutcomeKindParseError(s.to_string())),
        }
    }
}

impl Display for OverrideScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Institution => write!(f, "institution"),
            Self::Global => write!(f, "global"),
        }
    }
}

pub mod auditor;
pub mod drift;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reconcile::{OutcomeKind, ResolutionOutcome};

pub use auditor::{audit, audit_index, AuditScope};
pub use drift::{diff_reports, AuditDrift, IssueKey};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    /// Only institutions with at least one issue.
    pub institutions: Vec<InstitutionIssues>,
    pub totals: AuditTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstitutionIssues {
    pub code: String,
    pub name: String,
    pub panier_labels: Vec<String>,
    pub parcoursup_labels: Vec<String>,
    pub issues: Vec<AuditIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditIssue {
    pub panier_label: String,
    pub kind: IssueKind,
    pub message: String,
    pub outcome: ResolutionOutcome,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An override applies but none of its targets is offered.
    OverrideTargetMissing,
    /// No override and no plausible label.
    NoPlausibleMatch,
    /// Resolved by substring only, unconfirmed by any override.
    HeuristicOnly,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditTotals {
    pub institutions_audited: usize,
    pub institutions_with_issues: usize,
    pub total_issues: usize,
    #[serde(default)]
    pub outcomes: BTreeMap<OutcomeKind, usize>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.totals.total_issues == 0
    }

    pub fn issues(&self) -> impl Iterator<Item = (&InstitutionIssues, &AuditIssue)> {
        self.institutions
            .iter()
            .flat_map(|inst| inst.issues.iter().map(move |issue| (inst, issue)))
    }

    pub fn summary(&self) -> String {
        format!(
            "Institutions audited: {}\nInstitutions with issues: {}\nTotal discrepancies: {}",
            self.totals.institutions_audited,
            self.totals.institutions_with_issues,
            self.totals.total_issues
        )
    }
}

impl IssueKind {
    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::OverrideTargetMissing => "override_target_missing",
            Self::NoPlausibleMatch => "no_plausible_match",
            Self::HeuristicOnly => "heuristic_only",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, info};

use crate::audit::{AuditIssue, AuditReport, AuditTotals, InstitutionIssues, IssueKind};
use crate::catalog::{Catalog, CatalogIndex, InstitutionLabels};
use crate::reconcile::{resolve, OverrideStore, ResolutionOutcome, UnresolvedReason};

pub const DEFAULT_AGGREGATE_CATEGORY: &str = "CPGE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditScope {
    /// Substring selecting the selective-preparatory Parcoursup category.
    pub aggregate_category: String,
    /// Restricts audited panier labels to those containing this substring.
    pub label_filter: Option<String>,
}

impl Default for AuditScope {
    fn default() -> Self {
        Self {
            aggregate_category: DEFAULT_AGGREGATE_CATEGORY.to_string(),
            label_filter: None,
        }
    }
}

impl AuditScope {
    pub fn with_label_filter(mut self, filter: Option<String>) -> Self {
        self.label_filter = filter.filter(|f| !f.trim().is_empty());
        self
    }

    fn admits(&self, panier_label: &str) -> bool {
        self.label_filter
            .as_deref()
            .map(|needle| panier_label.contains(needle))
            .unwrap_or(true)
    }
}

pub fn audit(catalog: &Catalog, overrides: &OverrideStore, scope: &AuditScope) -> AuditReport {
    let index = CatalogIndex::build(catalog, &scope.aggregate_category);
    audit_index(&index, overrides, scope)
}

/// Resolves every (institution, panier label) pair and collects the ones
/// that need attention. Read-only and repeatable.
pub fn audit_index(index: &CatalogIndex, overrides: &OverrideStore, scope: &AuditScope) -> AuditReport {
    let mut totals = AuditTotals::default();
    let mut institutions = Vec::new();

    for labels in index.auditable() {
        let audited: Vec<&String> = labels
            .panier_labels
            .iter()
            .filter(|label| scope.admits(label))
            .collect();
        if audited.is_empty() {
            continue;
        }
        totals.institutions_audited += 1;

        let mut issues = Vec::new();
        for panier_label in audited {
            let outcome = resolve(
                overrides,
                panier_label,
                Some(labels.code.as_str()),
                &labels.parcoursup_labels,
            );
            *totals.outcomes.entry(outcome.kind()).or_insert(0) += 1;
            if let Some(issue) = issue_for(panier_label, outcome, &labels.parcoursup_labels) {
                issues.push(issue);
            }
        }

        if issues.is_empty() {
            continue;
        }
        debug!("{} ({}): {} issue(s)", labels.name, labels.code, issues.len());
        totals.institutions_with_issues += 1;
        totals.total_issues += issues.len();
        institutions.push(institution_entry(labels, issues));
    }

    info!(
        "audit complete: {} institutions, {} with issues, {} discrepancies",
        totals.institutions_audited, totals.institutions_with_issues, totals.total_issues
    );

    AuditReport {
        generated_at: Utc::now(),
        institutions,
        totals,
    }
}

fn issue_for(
    panier_label: &str,
    outcome: ResolutionOutcome,
    found: &BTreeSet<String>,
) -> Option<AuditIssue> {
    let (kind, message) = match &outcome {
        ResolutionOutcome::ExactMatch { .. } | ResolutionOutcome::ResolvedByOverride { .. } => {
            return None
        }
        ResolutionOutcome::ResolvedByHeuristic { target } => (
            IssueKind::HeuristicOnly,
            format!("Potential specialty mismatch: \"{panier_label}\" vs \"{target}\" (no override rule)"),
        ),
        ResolutionOutcome::Unresolved {
            reason: UnresolvedReason::OverrideTargetMissing { scope, targets },
        } => (
            IssueKind::OverrideTargetMissing,
            format!(
                "Mapped \"{panier_label}\" ({scope} rule) to [{}] but institution is missing all of them. (Found: [{}])",
                join(targets),
                join(found)
            ),
        ),
        ResolutionOutcome::Unresolved {
            reason: UnresolvedReason::NoMatch,
        } => (
            IssueKind::NoPlausibleMatch,
            format!(
                "Panier has \"{panier_label}\" but Parcoursup has no similar filière and no override rule. (Found: [{}])",
                join(found)
            ),
        ),
    };
    Some(AuditIssue {
        panier_label: panier_label.to_string(),
        kind,
        message,
        outcome,
    })
}

fn institution_entry(labels: &InstitutionLabels, issues: Vec<AuditIssue>) -> InstitutionIssues {
    InstitutionIssues {
        code: labels.code.clone(),
        name: labels.name.clone(),
        panier_labels: labels.panier_labels.iter().cloned().collect(),
        parcoursup_labels: labels.parcoursup_labels.iter().cloned().collect(),
        issues,
    }
}

fn join<'a>(labels: impl IntoIterator<Item = &'a String>) -> String {
    labels
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use crate::audit::{audit, AuditScope, IssueKind};
    use crate::catalog::fixtures::{cpge_formation, institution, panier, stat};
    use crate::catalog::Catalog;
    use crate::reconcile::{OutcomeKind, OverrideRule, OverrideStore};

    fn sample_catalog() -> Catalog {
        Catalog {
            institutions: vec![
                institution("X", "Lycée X"),
                institution("Y", "Lycée Y"),
                institution("Z", "Lycée Z"),
                institution("W", "Lycée W"),
            ],
            formations: vec![
                cpge_formation("X", "MPSI"),
                cpge_formation("X", "PCSI"),
                cpge_formation("Y", "ECG"),
                cpge_formation("Z", "MPSI"),
                cpge_formation("W", "TSI"),
            ],
            paniers: vec![
                panier("psi", "PSI"),
                panier("ecg", "ECG - Maths appliquées + HGG"),
                panier("mpsi", "MPSI"),
                panier("bl", "B/L - Lettres et sciences sociales"),
            ],
            panier_stats: vec![
                stat("psi", "X", Some(16.5)),
                stat("ecg", "Y", Some(15.2)),
                stat("mpsi", "Z", Some(17.0)),
                stat("bl", "Z", None),
            ],
        }
    }

    fn sample_rules() -> OverrideStore {
        OverrideStore::new(vec![
            OverrideRule::global("PSI", "MPSI"),
            OverrideRule::global("PSI", "PCSI"),
            OverrideRule::global("PSI", "PTSI"),
            OverrideRule::scoped(
                "ECG - Maths appliquées + HGG",
                "ECG - Maths appliquées + ESH",
                "Y",
            ),
        ])
    }

    #[test]
    fn reports_only_institutions_with_issues() {
        let report = audit(&sample_catalog(), &sample_rules(), &AuditScope::default());

        // W has no panier stats and is not audited
        assert_eq!(report.totals.institutions_audited, 3);
        assert_eq!(report.totals.institutions_with_issues, 2);
        assert_eq!(report.totals.total_issues, 2);
        assert!(!report.is_clean());

        let codes: Vec<_> = report.institutions.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["Y", "Z"]);

        let y = &report.institutions[0];
        assert_eq!(y.issues[0].kind, IssueKind::OverrideTargetMissing);
        assert!(y.issues[0]
            .message
            .contains("ECG - Maths appliquées + ESH"));
        assert!(y.issues[0].message.contains("Found: [ECG]"));

        let z = &report.institutions[1];
        assert_eq!(z.issues.len(), 1);
        assert_eq!(z.issues[0].kind, IssueKind::NoPlausibleMatch);
        assert_eq!(z.issues[0].panier_label, "B/L - Lettres et sciences sociales");

        assert_eq!(report.totals.outcomes[&OutcomeKind::ResolvedByOverride], 1);
        assert_eq!(report.totals.outcomes[&OutcomeKind::ExactMatch], 1);
        assert_eq!(report.totals.outcomes[&OutcomeKind::Unresolved], 2);
    }

    #[test]
    fn heuristic_resolution_is_still_reported() {
        let report = audit(
            &sample_catalog(),
            &OverrideStore::default(),
            &AuditScope::default(),
        );
        let y = report
            .institutions
            .iter()
            .find(|i| i.code == "Y")
            .expect("Y reported");
        assert_eq!(y.issues[0].kind, IssueKind::HeuristicOnly);
        assert!(y.issues[0].outcome.is_resolved());
        assert!(y.issues[0].message.contains("Potential specialty mismatch"));
    }

    #[test]
    fn label_filter_limits_audited_institutions() {
        let scope = AuditScope::default().with_label_filter(Some("ECG".to_string()));
        let report = audit(&sample_catalog(), &sample_rules(), &scope);
        assert_eq!(report.totals.institutions_audited, 1);
        assert_eq!(report.totals.total_issues, 1);
        assert_eq!(report.institutions[0].code, "Y");

        let blank = AuditScope::default().with_label_filter(Some("  ".to_string()));
        assert_eq!(blank.label_filter, None);
    }

    #[test]
    fn demo_dataset_audit() {
        let catalog: Catalog =
            serde_json::from_str(include_str!("../../demos/catalog.json")).expect("demo catalog");
        let rules: Vec<OverrideRule> =
            serde_json::from_str(include_str!("../../demos/overrides.json")).expect("demo rules");
        let report = audit(&catalog, &OverrideStore::new(rules), &AuditScope::default());

        assert_eq!(report.totals.institutions_audited, 3);
        assert_eq!(report.totals.institutions_with_issues, 2);
        let kinds: Vec<_> = report.issues().map(|(i, issue)| (i.code.as_str(), issue.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("0690026D", IssueKind::NoPlausibleMatch),
                ("0750655E", IssueKind::OverrideTargetMissing),
            ]
        );
    }

    #[test]
    fn audit_is_repeatable() {
        let catalog = sample_catalog();
        let rules = sample_rules();
        let first = audit(&catalog, &rules, &AuditScope::default());
        let second = audit(&catalog, &rules, &AuditScope::default());
        assert_eq!(first.institutions, second.institutions);
        assert_eq!(first.totals, second.totals);
    }
}

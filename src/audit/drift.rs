use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditIssue, AuditReport, IssueKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct IssueKey {
    pub institution: String,
    pub panier_label: String,
    pub kind: IssueKind,
}

/// Issues that appeared or disappeared between two audit runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDrift {
    pub previous_at: DateTime<Utc>,
    pub current_at: DateTime<Utc>,
    pub introduced: Vec<IssueKey>,
    pub cleared: Vec<IssueKey>,
    pub issue_delta: i64,
}

impl AuditDrift {
    pub fn is_empty(&self) -> bool {
        self.introduced.is_empty() && self.cleared.is_empty()
    }
}

pub fn diff_reports(previous: &AuditReport, current: &AuditReport) -> AuditDrift {
    let old_map = keyed(previous);
    let new_map = keyed(current);

    let introduced = new_map
        .keys()
        .filter(|key| !old_map.contains_key(*key))
        .cloned()
        .collect();
    let cleared = old_map
        .keys()
        .filter(|key| !new_map.contains_key(*key))
        .cloned()
        .collect();

    AuditDrift {
        previous_at: previous.generated_at,
        current_at: current.generated_at,
        introduced,
        cleared,
        issue_delta: current.totals.total_issues as i64 - previous.totals.total_issues as i64,
    }
}

fn keyed(report: &AuditReport) -> BTreeMap<IssueKey, &AuditIssue> {
    report
        .issues()
        .map(|(inst, issue)| {
            (
                IssueKey {
                    institution: inst.code.clone(),
                    panier_label: issue.panier_label.clone(),
                    kind: issue.kind,
                },
                issue,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::audit::{audit, diff_reports, AuditScope, IssueKind};
    use crate::catalog::fixtures::{cpge_formation, institution, panier, stat};
    use crate::catalog::Catalog;
    use crate::reconcile::{OverrideRule, OverrideStore};

    #[test]
    fn adding_a_rule_clears_and_introduces_issues() {
        let catalog = Catalog {
            institutions: vec![institution("A", "Lycée A")],
            formations: vec![cpge_formation("A", "ECG")],
            paniers: vec![panier("p", "ECG - Maths approfondies + HGG")],
            panier_stats: vec![stat("p", "A", None)],
        };
        let scope = AuditScope::default();

        let before = audit(&catalog, &OverrideStore::default(), &scope);
        let fixed = audit(
            &catalog,
            &OverrideStore::new(vec![OverrideRule::global(
                "ECG - Maths approfondies + HGG",
                "ECG",
            )]),
            &scope,
        );
        let drift = diff_reports(&before, &fixed);
        assert_eq!(drift.cleared.len(), 1);
        assert_eq!(drift.cleared[0].kind, IssueKind::HeuristicOnly);
        assert!(drift.introduced.is_empty());
        assert_eq!(drift.issue_delta, -1);

        let broken = audit(
            &catalog,
            &OverrideStore::new(vec![OverrideRule::global(
                "ECG - Maths approfondies + HGG",
                "ECG - Maths approfondies + ESH",
            )]),
            &scope,
        );
        let drift = diff_reports(&before, &broken);
        assert_eq!(drift.introduced.len(), 1);
        assert_eq!(drift.introduced[0].kind, IssueKind::OverrideTargetMissing);
        assert_eq!(drift.cleared.len(), 1);
        assert_eq!(drift.issue_delta, 0);

        assert!(diff_reports(&broken, &broken).is_empty());
    }
}

use std::collections::BTreeSet;

use tracing::debug;

use crate::reconcile::{OverrideStore, ResolutionOutcome, UnresolvedReason};

/// Maps a panier label onto the Parcoursup labels an institution offers.
///
/// First match wins: exact label, institution-scoped override, global
/// override, then substring heuristic. An override that points at labels the
/// institution does not offer is reported as unresolved and never falls
/// through to the heuristic.
///
/// The heuristic compares the stored text as-is: no case folding and no
/// accent stripping.
pub fn resolve(
    overrides: &OverrideStore,
    label: &str,
    institution: Option<&str>,
    candidates: &BTreeSet<String>,
) -> ResolutionOutcome {
    if candidates.contains(label) {
        return ResolutionOutcome::ExactMatch {
            target: label.to_string(),
        };
    }

    if let Some(hit) = overrides.lookup(label, institution) {
        let matched: BTreeSet<String> = hit.targets.intersection(candidates).cloned().collect();
        if matched.is_empty() {
            debug!(
                "override for {label:?} ({}) has no target offered by {:?}",
                hit.scope, institution
            );
            return ResolutionOutcome::Unresolved {
                reason: UnresolvedReason::OverrideTargetMissing {
                    scope: hit.scope,
                    targets: hit.targets.clone(),
                },
            };
        }
        return ResolutionOutcome::ResolvedByOverride {
            scope: hit.scope,
            targets: hit.targets.clone(),
            matched,
        };
    }

    match heuristic_match(label, candidates) {
        Some(candidate) => ResolutionOutcome::ResolvedByHeuristic {
            target: candidate.to_string(),
        },
        None => ResolutionOutcome::Unresolved {
            reason: UnresolvedReason::NoMatch,
        },
    }
}

fn heuristic_match<'a>(label: &str, candidates: &'a BTreeSet<String>) -> Option<&'a str> {
    if label.is_empty() {
        return None;
    }
    candidates
        .iter()
        .filter(|candidate| !candidate.is_empty())
        .find(|candidate| candidate.contains(label) || label.contains(candidate.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::reconcile::{
        resolve, OutcomeKind, OverrideRule, OverrideScope, OverrideStore, ResolutionOutcome,
        UnresolvedReason,
    };

    fn labels(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_wins_even_with_override() {
        let store = OverrideStore::new(vec![OverrideRule::global("MPSI", "PCSI")]);
        let outcome = resolve(&store, "MPSI", Some("A"), &labels(&["MPSI", "PCSI"]));
        assert_eq!(
            outcome,
            ResolutionOutcome::ExactMatch {
                target: "MPSI".to_string()
            }
        );
    }

    #[test]
    fn global_override_resolves_when_any_target_offered() {
        let store = OverrideStore::new(vec![
            OverrideRule::global("PSI", "MPSI"),
            OverrideRule::global("PSI", "PCSI"),
            OverrideRule::global("PSI", "PTSI"),
        ]);
        let outcome = resolve(&store, "PSI", Some("X"), &labels(&["MPSI", "PCSI"]));
        match outcome {
            ResolutionOutcome::ResolvedByOverride {
                scope,
                targets,
                matched,
            } => {
                assert_eq!(scope, OverrideScope::Global);
                assert_eq!(targets, labels(&["MPSI", "PCSI", "PTSI"]));
                assert_eq!(matched, labels(&["MPSI", "PCSI"]));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn institution_override_preferred_over_global() {
        let store = OverrideStore::new(vec![
            OverrideRule::global("BCPST", "BCPST Véto"),
            OverrideRule::scoped("BCPST", "BCPST Agro", "Y"),
        ]);
        let candidates = labels(&["BCPST Véto", "BCPST Agro"]);
        let outcome = resolve(&store, "BCPST", Some("Y"), &candidates);
        assert_eq!(outcome.targets(), labels(&["BCPST Agro"]));

        // scoped rule missing its target must not fall back to the global one
        let outcome = resolve(&store, "BCPST", Some("Y"), &labels(&["BCPST Véto"]));
        assert_eq!(outcome.kind(), OutcomeKind::Unresolved);
        assert_eq!(outcome.targets(), labels(&["BCPST Agro"]));
    }

    #[test]
    fn scoped_override_without_target_is_unresolved() {
        let store = OverrideStore::new(vec![OverrideRule::scoped(
            "ECG - Maths appliquées + HGG",
            "ECG - Maths appliquées + ESH",
            "Y",
        )]);
        let outcome = resolve(
            &store,
            "ECG - Maths appliquées + HGG",
            Some("Y"),
            &labels(&["ECG"]),
        );
        assert_eq!(
            outcome,
            ResolutionOutcome::Unresolved {
                reason: UnresolvedReason::OverrideTargetMissing {
                    scope: OverrideScope::Institution,
                    targets: labels(&["ECG - Maths appliquées + ESH"]),
                }
            }
        );
    }

    #[test]
    fn heuristic_only_without_applicable_override() {
        let store = OverrideStore::default();
        let outcome = resolve(
            &store,
            "ECG - Maths appliquées + HGG",
            Some("Y"),
            &labels(&["ECG"]),
        );
        assert_eq!(
            outcome,
            ResolutionOutcome::ResolvedByHeuristic {
                target: "ECG".to_string()
            }
        );
        assert!(outcome.needs_review());

        // candidate containing the label also counts
        let outcome = resolve(&store, "MP2I", None, &labels(&["MP2I - Informatique"]));
        assert_eq!(outcome.kind(), OutcomeKind::ResolvedByHeuristic);
    }

    #[test]
    fn heuristic_is_case_and_accent_sensitive() {
        let store = OverrideStore::default();
        let outcome = resolve(&store, "Lettres", None, &labels(&["lettres supérieures"]));
        assert_eq!(outcome.kind(), OutcomeKind::Unresolved);
        let outcome = resolve(&store, "Economie", None, &labels(&["Économie"]));
        assert_eq!(outcome.kind(), OutcomeKind::Unresolved);
    }

    #[test]
    fn empty_candidate_never_matches_heuristically() {
        let store = OverrideStore::default();
        let outcome = resolve(&store, "TSI", None, &labels(&[""]));
        assert_eq!(
            outcome,
            ResolutionOutcome::Unresolved {
                reason: UnresolvedReason::NoMatch
            }
        );
        assert!(outcome.targets().is_empty());
    }

    #[test]
    fn empty_label_never_matches_heuristically() {
        let store = OverrideStore::default();
        let outcome = resolve(&store, "", Some("A"), &labels(&["MPSI", "PCSI"]));
        assert_eq!(
            outcome,
            ResolutionOutcome::Unresolved {
                reason: UnresolvedReason::NoMatch
            }
        );
    }
}

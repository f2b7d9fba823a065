use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;

/// Distinct labels of both taxonomies known for one institution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstitutionLabels {
    pub code: String,
    pub name: String,
    pub panier_labels: BTreeSet<String>,
    pub parcoursup_labels: BTreeSet<String>,
    pub panier_record_count: usize,
}

impl InstitutionLabels {
    pub fn has_panier_records(&self) -> bool {
        self.panier_record_count > 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    by_institution: BTreeMap<String, InstitutionLabels>,
}

impl CatalogIndex {
    /// Groups both taxonomies per institution code. Parcoursup formations
    /// are kept only when their aggregated category contains
    /// `aggregate_category`, and only their "bis" label is indexed.
    pub fn build(catalog: &Catalog, aggregate_category: &str) -> Self {
        let mut by_institution: BTreeMap<String, InstitutionLabels> = BTreeMap::new();

        for institution in &catalog.institutions {
            by_institution
                .entry(institution.code.clone())
                .or_insert_with(|| InstitutionLabels {
                    code: institution.code.clone(),
                    name: institution.name.clone(),
                    ..InstitutionLabels::default()
                });
        }

        for stat in &catalog.panier_stats {
            let Some(panier) = catalog.panier(&stat.panier_id) else {
                debug!(
                    "panier stats for {} reference unknown panier {}",
                    stat.institution, stat.panier_id
                );
                continue;
            };
            let entry = entry_for(&mut by_institution, &stat.institution);
            entry.panier_record_count += 1;
            entry.panier_labels.insert(panier.cpge_type.clone());
        }

        for formation in &catalog.formations {
            if !formation.category.contains(aggregate_category) {
                continue;
            }
            let entry = entry_for(&mut by_institution, &formation.institution);
            if let Some(bis) = &formation.filiere_bis {
                entry.parcoursup_labels.insert(bis.clone());
            }
        }

        Self { by_institution }
    }

    pub fn get(&self, code: &str) -> Option<&InstitutionLabels> {
        self.by_institution.get(code)
    }

    /// Institutions carrying at least one panier statistics record, in code order.
    pub fn auditable(&self) -> impl Iterator<Item = &InstitutionLabels> {
        self.by_institution
            .values()
            .filter(|labels| labels.has_panier_records())
    }

    pub fn len(&self) -> usize {
        self.by_institution.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_institution.is_empty()
    }
}

fn entry_for<'a>(
    map: &'a mut BTreeMap<String, InstitutionLabels>,
    code: &str,
) -> &'a mut InstitutionLabels {
    map.entry(code.to_string())
        .or_insert_with(|| InstitutionLabels {
            code: code.to_string(),
            ..InstitutionLabels::default()
        })
}

#[cfg(test)]
mod tests {
    use crate::catalog::fixtures::{cpge_formation, institution, panier, stat};
    use crate::catalog::{Catalog, CatalogIndex, Formation};

    #[test]
    fn indexes_labels_per_institution_and_filters_category() {
        let mut licence = cpge_formation("A", "Licence Maths");
        licence.category = "Licence".to_string();
        let catalog = Catalog {
            institutions: vec![institution("A", "Lycée A"), institution("B", "Lycée B")],
            formations: vec![
                cpge_formation("A", "MPSI"),
                cpge_formation("A", "PCSI"),
                cpge_formation("A", "MPSI"),
                licence,
                Formation {
                    filiere_bis: None,
                    ..cpge_formation("B", "ignored")
                },
            ],
            paniers: vec![panier("p1", "PSI"), panier("p2", "MPSI")],
            panier_stats: vec![stat("p1", "A", None), stat("p2", "A", None)],
        };

        let index = CatalogIndex::build(&catalog, "CPGE");
        let a = index.get("A").expect("A indexed");
        assert_eq!(a.name, "Lycée A");
        assert_eq!(a.panier_record_count, 2);
        assert_eq!(
            a.parcoursup_labels.iter().cloned().collect::<Vec<_>>(),
            vec!["MPSI".to_string(), "PCSI".to_string()]
        );
        assert!(a.panier_labels.contains("PSI"));

        let b = index.get("B").expect("B indexed");
        assert!(b.parcoursup_labels.is_empty());
        assert!(!b.has_panier_records());

        let auditable: Vec<_> = index.auditable().map(|l| l.code.as_str()).collect();
        assert_eq!(auditable, vec!["A"]);
    }

    #[test]
    fn stats_for_unlisted_institution_still_indexed() {
        let catalog = Catalog {
            paniers: vec![panier("p1", "ECG")],
            panier_stats: vec![stat("p1", "Z", Some(14.0)), stat("nope", "Y", None)],
            ..Catalog::default()
        };
        let index = CatalogIndex::build(&catalog, "CPGE");
        assert_eq!(index.len(), 1);
        let z = index.get("Z").expect("Z indexed");
        assert!(z.name.is_empty());
        assert!(z.has_panier_records());
    }
}

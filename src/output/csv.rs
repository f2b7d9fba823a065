use anyhow::Result;

use crate::audit::AuditReport;
use crate::scoring::RankedProgram;

pub fn audit_to_csv(report: &AuditReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "institution_code",
        "institution_name",
        "panier_label",
        "issue",
        "outcome",
        "targets",
        "message",
    ])?;
    for (inst, issue) in report.issues() {
        writer.write_record([
            inst.code.clone(),
            inst.name.clone(),
            issue.panier_label.clone(),
            issue.kind.to_string(),
            issue.outcome.kind().to_string(),
            issue
                .outcome
                .targets()
                .into_iter()
                .collect::<Vec<_>>()
                .join("|"),
            issue.message.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn ranking_to_csv(items: &[RankedProgram]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "rank",
        "institution_code",
        "institution_name",
        "program",
        "program_grade",
        "specialty_rate_pct",
        "grade_score",
        "specialty_score",
        "combined_score",
        "band",
        "published_rate_pct",
    ])?;
    for item in items {
        writer.write_record([
            item.rank.to_string(),
            item.candidate.institution.clone(),
            item.candidate.institution_name.clone(),
            item.candidate.label.clone(),
            item.candidate
                .program_grade
                .map(|g| format!("{g:.2}"))
                .unwrap_or_default(),
            item.candidate
                .specialty_rate_pct
                .map(|r| format!("{r:.1}"))
                .unwrap_or_default(),
            format!("{:.2}", item.score.grade_score),
            format!("{:.2}", item.score.specialty_score),
            format!("{:.2}", item.score.combined_score),
            item.score.band.as_slug().to_string(),
            item.candidate
                .published_rate_pct
                .map(|r| format!("{r:.1}"))
                .unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::{audit_to_csv, ranking_to_csv};
    use crate::audit::{audit, AuditScope};
    use crate::catalog::fixtures::{cpge_formation, institution, panier, stat};
    use crate::catalog::Catalog;
    use crate::reconcile::OverrideStore;
    use crate::scoring::{rank_programs, ProgramCandidate};

    #[test]
    fn audit_csv_has_one_row_per_issue() {
        let catalog = Catalog {
            institutions: vec![institution("A", "Lycée, A")],
            formations: vec![cpge_formation("A", "TSI")],
            paniers: vec![panier("p", "ATS")],
            panier_stats: vec![stat("p", "A", None)],
        };
        let report = audit(&catalog, &OverrideStore::default(), &AuditScope::default());
        let csv = audit_to_csv(&report).expect("csv");
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("A,\"Lycée, A\",ATS,no_plausible_match,unresolved"));
    }

    #[test]
    fn ranking_csv_rows() {
        let ranked = rank_programs(
            16.0,
            vec![ProgramCandidate {
                institution: "X".to_string(),
                institution_name: "Lycée X".to_string(),
                label: "PSI".to_string(),
                program_grade: Some(15.0),
                specialty_rate_pct: Some(60.0),
                published_rate_pct: None,
            }],
        );
        let csv = ranking_to_csv(&ranked).expect("csv");
        assert!(csv.contains("1,X,Lycée X,PSI,15.00,60.0,90.00,60.00,75.00,favorable,"));
    }
}

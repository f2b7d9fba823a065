use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::audit::{AuditDrift, AuditReport, IssueKind};
use crate::reconcile::{Confidence, OutcomeKind, ResolutionOutcome};
use crate::scoring::{AdmissionScore, GradeGap, RankedProgram, RiskBand};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn band_color(band: RiskBand) -> Color {
    match band {
        RiskBand::VeryFavorable => Color::Green,
        RiskBand::Favorable => Color::DarkGreen,
        RiskBand::BorderlineFavorable => Color::Yellow,
        RiskBand::BorderlineUnfavorable => Color::DarkYellow,
        RiskBand::Unfavorable => Color::Red,
    }
}

fn issue_color(kind: IssueKind) -> Color {
    match kind {
        IssueKind::HeuristicOnly => Color::Yellow,
        IssueKind::OverrideTargetMissing | IssueKind::NoPlausibleMatch => Color::Red,
    }
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_audit_table(report: &AuditReport) -> String {
    let mut table = new_table();
    table.set_header(vec!["Institution", "Code", "Panier label", "Issue", "Detail"]);
    for (inst, issue) in report.issues() {
        table.add_row(Row::from(vec![
            Cell::new(&inst.name),
            Cell::new(&inst.code),
            Cell::new(&issue.panier_label),
            Cell::new(issue.kind.to_string()).fg(issue_color(issue.kind)),
            Cell::new(&issue.message),
        ]));
    }

    let mut out = table.to_string();
    out.push('\n');
    out.push_str(&report.summary());
    for kind in OutcomeKind::ALL {
        let count = report.totals.outcomes.get(&kind).copied().unwrap_or(0);
        out.push_str(&format!("\n  {kind}: {count}"));
    }
    out
}

pub fn render_resolution_table(
    label: &str,
    institution: Option<&str>,
    outcome: &ResolutionOutcome,
) -> String {
    let mut table = new_table();
    table.set_header(vec!["Panier label", "Institution", "Outcome", "Confidence", "Targets"]);
    let confidence = match outcome.confidence() {
        Confidence::High => Cell::new("HIGH").fg(Color::Green),
        Confidence::Low => Cell::new("LOW (review)").fg(Color::Yellow),
        Confidence::None => Cell::new("NONE").fg(Color::Red),
    };
    table.add_row(Row::from(vec![
        Cell::new(label),
        Cell::new(institution.unwrap_or("-")),
        Cell::new(outcome.kind().to_string()),
        confidence,
        Cell::new(
            outcome
                .targets()
                .into_iter()
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ]));
    table.to_string()
}

pub fn render_score_table(result: &AdmissionScore) -> String {
    let mut table = new_table();
    table.set_header(vec!["Component", "Value", "Note"]);
    table.add_row(vec![
        "Grade difference".to_string(),
        format!("{:+.2}", result.grade_diff),
        if result.used_fallback_grade {
            "program grade unknown, neutral fallback".to_string()
        } else {
            String::new()
        },
    ]);
    table.add_row(vec![
        "Grade score".to_string(),
        format!("{:.1}", result.grade_score),
        String::new(),
    ]);
    table.add_row(vec![
        "Specialty score".to_string(),
        format!("{:.1}", result.specialty_score),
        if result.used_fallback_specialty {
            "no specialty statistic, neutral fallback".to_string()
        } else {
            String::new()
        },
    ]);
    table.add_row(Row::from(vec![
        Cell::new("Combined score"),
        Cell::new(format!("{:.1}", result.combined_score)).fg(band_color(result.band)),
        Cell::new(result.band.to_string()).fg(band_color(result.band)),
    ]));
    table.to_string()
}

pub fn render_ranking_table(items: &[RankedProgram]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Rank",
        "Institution",
        "Program",
        "Program grade",
        "Specialty %",
        "Published %",
        "Score",
        "Band",
        "Grade gap",
    ]);
    for item in items {
        let gap = match item.grade_gap {
            GradeGap::Comfortable => Cell::new("comfortable").fg(Color::Green),
            GradeGap::Reach => Cell::new("reach").fg(Color::Yellow),
            GradeGap::Stretch => Cell::new("stretch").fg(Color::Red),
            GradeGap::Unknown => Cell::new("-"),
        };
        let name = if item.candidate.institution_name.is_empty() {
            item.candidate.institution.clone()
        } else {
            format!(
                "{} ({})",
                item.candidate.institution_name, item.candidate.institution
            )
        };
        table.add_row(Row::from(vec![
            Cell::new(item.rank),
            Cell::new(name),
            Cell::new(&item.candidate.label),
            Cell::new(optional(item.candidate.program_grade, 1)),
            Cell::new(optional(item.candidate.specialty_rate_pct, 0)),
            Cell::new(optional(item.candidate.published_rate_pct, 0)),
            Cell::new(format!("{:.1}", item.score.combined_score)),
            Cell::new(item.score.band.to_string()).fg(band_color(item.score.band)),
            gap,
        ]));
    }
    table.to_string()
}

pub fn render_drift_table(drift: &AuditDrift) -> String {
    let mut table = new_table();
    table.set_header(vec!["Change", "Institution", "Panier label", "Issue"]);
    for key in &drift.introduced {
        table.add_row(Row::from(vec![
            Cell::new("introduced").fg(Color::Red),
            Cell::new(&key.institution),
            Cell::new(&key.panier_label),
            Cell::new(key.kind.to_string()),
        ]));
    }
    for key in &drift.cleared {
        table.add_row(Row::from(vec![
            Cell::new("cleared").fg(Color::Green),
            Cell::new(&key.institution),
            Cell::new(&key.panier_label),
            Cell::new(key.kind.to_string()),
        ]));
    }
    format!("{table}\nNet issue change: {:+}", drift.issue_delta)
}

#[cfg(test)]
mod tests {
    use super::{render_ranking_table, render_score_table};
    use crate::scoring::{rank_programs, score, ProgramCandidate};

    #[test]
    fn score_table_mentions_fallbacks() {
        let rendered = render_score_table(&score(15.0, None, Some(70.0)));
        assert!(rendered.contains("neutral fallback"));
        assert!(rendered.contains("Combined score"));
    }

    #[test]
    fn ranking_table_lists_institutions() {
        let ranked = rank_programs(
            16.0,
            vec![ProgramCandidate {
                institution: "0750655E".to_string(),
                institution_name: "Henri IV".to_string(),
                label: "MPSI".to_string(),
                program_grade: Some(17.2),
                specialty_rate_pct: None,
                published_rate_pct: Some(62.0),
            }],
        );
        let rendered = render_ranking_table(&ranked);
        assert!(rendered.contains("Henri IV (0750655E)"));
        assert!(rendered.contains("17.2"));
        assert!(rendered.contains("Published %"));
    }
}

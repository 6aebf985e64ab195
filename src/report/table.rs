use tabled::{settings::Style, Table, Tabled};

use super::{is_newer, ReportSummary};
use crate::model::AnalysisRow;

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Package")]
    name: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Advisories")]
    security: String,
}

/// Prints the report rows and a one-line summary to stdout.
pub fn print_table(rows: &[AnalysisRow]) {
    if rows.is_empty() {
        println!("No dependencies found.");
        return;
    }

    let table_rows: Vec<ReportRow> = rows
        .iter()
        .map(|row| ReportRow {
            name: truncate(&row.name, 50),
            current: row.current_version.clone(),
            latest: format_latest(row),
            security: row.security_issues.to_string(),
        })
        .collect();

    let table = Table::new(table_rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
    print_summary(&ReportSummary::from_rows(rows));
}

fn print_summary(summary: &ReportSummary) {
    println!(
        "{} dependencies: {} outdated, {} with advisories, {} incomplete",
        summary.total, summary.outdated, summary.vulnerable, summary.unknown
    );
}

fn format_latest(row: &AnalysisRow) -> String {
    if is_newer(&row.latest_version, &row.current_version) {
        format!("{} *", row.latest_version)
    } else {
        row.latest_version.clone()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

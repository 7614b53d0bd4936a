use std::collections::HashMap;
use std::io::Write;

use super::domain::{sort_by_urgency, IssueReport, SourceId, WaterSource};

pub const OPEN_ISSUES_FILENAME: &str = "open_issues.csv";
const HEADER: [&str; 5] = ["ID", "Source", "Priority", "Description", "Reported At"];

/// Writes unresolved issues as CSV, most urgent first.
pub fn write_open_issues<W: Write>(
    writer: W,
    issues: &[IssueReport],
    sources: &[WaterSource],
) -> Result<(), csv::Error> {
    let names: HashMap<SourceId, &str> = sources
        .iter()
        .map(|source| (source.id, source.name.as_str()))
        .collect();
    let mut open: Vec<IssueReport> = issues
        .iter()
        .filter(|issue| !issue.is_resolved)
        .cloned()
        .collect();
    sort_by_urgency(&mut open);

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER)?;
    for issue in &open {
        let source = names.get(&issue.source_id).copied().unwrap_or_default();
        csv_writer.write_record([
            issue.id.to_string().as_str(),
            source,
            issue.priority.label(),
            issue.description.as_str(),
            issue.reported_at.format("%Y-%m-%d %H:%M").to_string().as_str(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

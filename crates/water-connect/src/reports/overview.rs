use serde::Serialize;

use crate::registry::{IssueReport, SourceStatus, SourceSummary, WaterSource};

const RECENT_SOURCES: usize = 5;

/// Landing page statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub total_sources: usize,
    pub open_issues: usize,
    pub operational_sources: usize,
    /// Most recently updated sources first.
    pub recent_sources: Vec<SourceSummary>,
}

pub fn build_overview(mut sources: Vec<WaterSource>, issues: &[IssueReport]) -> Overview {
    let open: Vec<&IssueReport> = issues.iter().filter(|issue| !issue.is_resolved).collect();
    let operational_sources = sources
        .iter()
        .filter(|source| source.status == SourceStatus::Operational)
        .count();
    let total_sources = sources.len();

    sources.sort_by(|a, b| b.last_updated.cmp(&a.last_updated).then(b.id.cmp(&a.id)));
    let recent_sources = sources
        .into_iter()
        .take(RECENT_SOURCES)
        .map(|source| {
            let count = open
                .iter()
                .filter(|issue| issue.source_id == source.id)
                .count();
            SourceSummary::new(source, count)
        })
        .collect();

    Overview {
        total_sources,
        open_issues: open.len(),
        operational_sources,
        recent_sources,
    }
}

//! Role-selected dashboards: staff first, then vendor owners, then residents.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::marketplace::{
    average_rating, ClickKind, OrderStatus, VendorClickLog, VendorReview, WaterOrder, WaterVendor,
};
use crate::registry::{
    sort_by_urgency, IssueReport, SourceStatus, SourceSummary, SourceType, WaterSource,
};

pub(crate) const CLICK_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Staff(StaffDashboard),
    Vendor(VendorDashboard),
    Resident(ResidentDashboard),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelledCount<K> {
    pub key: K,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffDashboard {
    pub sources: Vec<SourceSummary>,
    pub open_issues: Vec<IssueReport>,
    pub status_counts: Vec<LabelledCount<SourceStatus>>,
    pub source_type_counts: Vec<LabelledCount<SourceType>>,
    pub total_sources: usize,
    pub total_open_issues: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickSummary {
    pub total: usize,
    pub profile_views: usize,
    pub calls: usize,
    pub whatsapp: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorDashboard {
    pub vendor: WaterVendor,
    pub clicks_last_7_days: ClickSummary,
    pub orders_by_status: Vec<LabelledCount<OrderStatus>>,
    pub recent_orders: Vec<WaterOrder>,
    pub average_rating: Option<Decimal>,
    pub review_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResidentDashboard {
    pub issue_reports: Vec<IssueReport>,
    pub orders: Vec<WaterOrder>,
}

/// Sources by name with open-issue counts, plus the urgency-ordered backlog.
pub fn staff_dashboard(mut sources: Vec<WaterSource>, issues: Vec<IssueReport>) -> StaffDashboard {
    let mut open_issues: Vec<IssueReport> =
        issues.into_iter().filter(|issue| !issue.is_resolved).collect();
    sort_by_urgency(&mut open_issues);
    sources.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let status_counts = SourceStatus::ordered()
        .into_iter()
        .map(|status| LabelledCount {
            key: status,
            label: status.label(),
            count: sources.iter().filter(|s| s.status == status).count(),
        })
        .collect();
    let source_type_counts = SourceType::ordered()
        .into_iter()
        .map(|kind| LabelledCount {
            key: kind,
            label: kind.label(),
            count: sources.iter().filter(|s| s.source_type == kind).count(),
        })
        .collect();

    let total_sources = sources.len();
    let total_open_issues = open_issues.len();
    let sources = sources
        .into_iter()
        .map(|source| {
            let count = open_issues
                .iter()
                .filter(|issue| issue.source_id == source.id)
                .count();
            SourceSummary::new(source, count)
        })
        .collect();

    StaffDashboard {
        sources,
        open_issues,
        status_counts,
        source_type_counts,
        total_sources,
        total_open_issues,
    }
}

/// Start of the click analytics window ending at `now`.
pub fn click_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(CLICK_WINDOW_DAYS)
}

pub fn summarize_clicks(clicks: &[VendorClickLog]) -> ClickSummary {
    let count = |kind: ClickKind| clicks.iter().filter(|click| click.kind == kind).count();
    ClickSummary {
        total: clicks.len(),
        profile_views: count(ClickKind::ProfileView),
        calls: count(ClickKind::Call),
        whatsapp: count(ClickKind::Whatsapp),
    }
}

pub fn vendor_dashboard(
    vendor: WaterVendor,
    clicks: &[VendorClickLog],
    mut orders: Vec<WaterOrder>,
    reviews: &[VendorReview],
) -> VendorDashboard {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let orders_by_status = OrderStatus::ordered()
        .into_iter()
        .map(|status| LabelledCount {
            key: status,
            label: status.label(),
            count: orders.iter().filter(|order| order.status == status).count(),
        })
        .collect();

    VendorDashboard {
        vendor,
        clicks_last_7_days: summarize_clicks(clicks),
        orders_by_status,
        recent_orders: orders,
        average_rating: average_rating(reviews),
        review_count: reviews.len(),
    }
}

pub fn resident_dashboard(
    mut issue_reports: Vec<IssueReport>,
    mut orders: Vec<WaterOrder>,
) -> ResidentDashboard {
    issue_reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at).then(b.id.cmp(&a.id)));
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    ResidentDashboard {
        issue_reports,
        orders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::{ClickId, VendorId};
    use crate::registry::{IssueId, Priority, SourceId};
    use crate::test_support::source_fixture;

    fn issue(id: u64, priority: Priority, minutes_ago: i64, is_resolved: bool) -> IssueReport {
        IssueReport {
            id: IssueId(id),
            source_id: SourceId(1),
            reporter: None,
            description: "Low pressure".to_string(),
            priority,
            is_resolved,
            reported_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    fn click(id: u64, kind: ClickKind) -> VendorClickLog {
        VendorClickLog {
            id: ClickId(id),
            vendor_id: VendorId(1),
            kind,
            clicked_at: Utc::now(),
        }
    }

    #[test]
    fn staff_view_orders_sources_and_backlog() {
        let mut zebra = source_fixture(1);
        zebra.name = "Zebra Tap".to_string();
        let mut alpha = source_fixture(2);
        alpha.name = "Alpha Well".to_string();
        alpha.status = SourceStatus::Maintenance;

        let issues = vec![
            issue(1, Priority::Low, 1, false),
            issue(2, Priority::High, 30, false),
            issue(3, Priority::High, 5, false),
            issue(4, Priority::High, 0, true),
        ];
        let dashboard = staff_dashboard(vec![zebra, alpha], issues);

        let names: Vec<&str> = dashboard
            .sources
            .iter()
            .map(|summary| summary.source.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha Well", "Zebra Tap"]);
        let backlog: Vec<u64> = dashboard.open_issues.iter().map(|i| i.id.0).collect();
        assert_eq!(backlog, vec![3, 2, 1]);
        assert_eq!(dashboard.total_open_issues, 3);
        assert_eq!(dashboard.total_sources, 2);
        assert_eq!(dashboard.sources[1].open_issue_count, 3);

        let maintenance = dashboard
            .status_counts
            .iter()
            .find(|count| count.key == SourceStatus::Maintenance)
            .expect("maintenance count");
        assert_eq!(maintenance.count, 1);
        let boreholes = dashboard
            .source_type_counts
            .iter()
            .find(|count| count.key == SourceType::Borehole)
            .expect("borehole count");
        assert_eq!(boreholes.count, 2);
    }

    #[test]
    fn clicks_are_counted_by_kind() {
        let clicks = [
            click(1, ClickKind::ProfileView),
            click(2, ClickKind::ProfileView),
            click(3, ClickKind::Call),
            click(4, ClickKind::Whatsapp),
        ];
        assert_eq!(
            summarize_clicks(&clicks),
            ClickSummary {
                total: 4,
                profile_views: 2,
                calls: 1,
                whatsapp: 1,
            }
        );
    }

    #[test]
    fn click_window_spans_a_week() {
        let now = Utc::now();
        assert_eq!(now - click_window_start(now), Duration::days(7));
    }

    #[test]
    fn dashboard_is_tagged_by_role() {
        let json = serde_json::to_value(Dashboard::Resident(resident_dashboard(
            vec![issue(1, Priority::Low, 10, false), issue(2, Priority::Low, 1, false)],
            Vec::new(),
        )))
        .expect("json");
        assert_eq!(json["role"], "resident");
        assert_eq!(json["issue_reports"][0]["id"], 2);
    }
}

//! Landing overview, role-based dashboards, and map markers.

mod dashboard;
mod map;
mod overview;
mod router;
mod service;

#[cfg(test)]
mod tests;

pub use dashboard::{
    click_window_start, resident_dashboard, staff_dashboard, summarize_clicks, vendor_dashboard,
    ClickSummary, Dashboard, LabelledCount, ResidentDashboard, StaffDashboard, VendorDashboard,
};
pub use map::{map_points, MapPoint, MarkerKind};
pub use overview::{build_overview, Overview};
pub use router::reports_router;
pub use service::ReportService;

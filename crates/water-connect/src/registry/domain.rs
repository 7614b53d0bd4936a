use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::{Account, AccountId};

record_id!(
    /// Identifier wrapper for water sources.
    SourceId
);
record_id!(
    /// Identifier wrapper for issue reports.
    IssueId
);
record_id!(
    /// Identifier wrapper for repair logs.
    RepairId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Borehole,
    Well,
    Tap,
    RiverIntake,
    PublicPump,
}

impl SourceType {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Borehole,
            Self::Well,
            Self::Tap,
            Self::RiverIntake,
            Self::PublicPump,
        ]
    }

    /// Two-letter code used by exports and legacy data.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Borehole => "BH",
            Self::Well => "WL",
            Self::Tap => "TP",
            Self::RiverIntake => "RI",
            Self::PublicPump => "PP",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Borehole => "Borehole",
            Self::Well => "Well",
            Self::Tap => "Tap",
            Self::RiverIntake => "River Intake",
            Self::PublicPump => "Public Pump",
        }
    }

    /// Accepts the snake_case name or the two-letter code.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ordered().into_iter().find(|kind| {
            raw.eq_ignore_ascii_case(kind.code()) || raw.eq_ignore_ascii_case(kind.slug())
        })
    }

    const fn slug(self) -> &'static str {
        match self {
            Self::Borehole => "borehole",
            Self::Well => "well",
            Self::Tap => "tap",
            Self::RiverIntake => "river_intake",
            Self::PublicPump => "public_pump",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    #[default]
    Operational,
    Maintenance,
    Broken,
    Contaminated,
}

impl SourceStatus {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Operational,
            Self::Maintenance,
            Self::Broken,
            Self::Contaminated,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Operational => "Operational",
            Self::Maintenance => "Maintenance",
            Self::Broken => "Broken/Non-Operational",
            Self::Contaminated => "Contaminated",
        }
    }

    /// CSS color class used by map markers and status badges.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Operational => "success",
            Self::Maintenance => "warning",
            Self::Broken => "brown-custom",
            Self::Contaminated => "danger",
        }
    }

    const fn code(self) -> &'static str {
        match self {
            Self::Operational => "O",
            Self::Maintenance => "M",
            Self::Broken => "B",
            Self::Contaminated => "C",
        }
    }

    const fn slug(self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::Maintenance => "maintenance",
            Self::Broken => "broken",
            Self::Contaminated => "contaminated",
        }
    }

    /// Accepts the snake_case name or the single-letter code.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ordered().into_iter().find(|status| {
            raw.eq_ignore_ascii_case(status.code()) || raw.eq_ignore_ascii_case(status.slug())
        })
    }
}

/// A physical water access point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterSource {
    pub id: SourceId,
    pub name: String,
    pub source_type: SourceType,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub status: SourceStatus,
    pub is_verified: bool,
    pub created_by: Option<AccountId>,
    pub installation_date: NaiveDate,
    pub description: String,
    pub last_updated: DateTime<Utc>,
}

impl WaterSource {
    /// Only the creator or a superuser may delete a source.
    pub fn can_be_deleted_by(&self, account: &Account) -> bool {
        account.is_superuser || self.created_by == Some(account.id)
    }

    /// Editing additionally allows staff, who administer status by hand.
    pub fn can_be_edited_by(&self, account: &Account) -> bool {
        account.is_administrator() || self.created_by == Some(account.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWaterSource {
    pub name: String,
    pub source_type: SourceType,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub status: SourceStatus,
    pub is_verified: bool,
    pub created_by: Option<AccountId>,
    pub installation_date: NaiveDate,
    pub description: String,
    pub last_updated: DateTime<Utc>,
}

/// Issue urgency; level 3 forces the source into maintenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    pub const fn level(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.level()
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_level(value).ok_or_else(|| format!("priority level {value} is not 1, 2, or 3"))
    }
}

/// Resident complaint about a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    pub id: IssueId,
    pub source_id: SourceId,
    pub reporter: Option<AccountId>,
    pub description: String,
    pub priority: Priority,
    pub is_resolved: bool,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssueReport {
    pub source_id: SourceId,
    pub reporter: Option<AccountId>,
    pub description: String,
    pub priority: Priority,
    pub reported_at: DateTime<Utc>,
}

/// Maintenance performed on a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairLog {
    pub id: RepairId,
    pub source_id: SourceId,
    pub technician: Option<AccountId>,
    pub repair_date: NaiveDate,
    pub work_done: String,
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepairLog {
    pub source_id: SourceId,
    pub technician: Option<AccountId>,
    pub repair_date: NaiveDate,
    pub work_done: String,
    pub cost: Option<Decimal>,
}

/// Sorts issues the way every staff listing shows them: most urgent, then newest.
pub fn sort_by_urgency(issues: &mut [IssueReport]) {
    issues.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.reported_at.cmp(&a.reported_at))
            .then(b.id.cmp(&a.id))
    });
}

/// Row in the public source listing.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    #[serde(flatten)]
    pub source: WaterSource,
    pub source_type_label: &'static str,
    pub status_label: &'static str,
    pub status_color: &'static str,
    pub open_issue_count: usize,
}

impl SourceSummary {
    pub fn new(source: WaterSource, open_issue_count: usize) -> Self {
        Self {
            source_type_label: source.source_type.label(),
            status_label: source.status.label(),
            status_color: source.status.color(),
            source,
            open_issue_count,
        }
    }
}

/// Single source with its open issues and repair history (newest first).
#[derive(Debug, Clone, Serialize)]
pub struct SourceDetail {
    #[serde(flatten)]
    pub summary: SourceSummary,
    pub open_issues: Vec<IssueReport>,
    pub repair_history: Vec<RepairLog>,
}

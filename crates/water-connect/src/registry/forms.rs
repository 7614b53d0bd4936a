use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::domain::{Priority, SourceId, SourceStatus, SourceType};
use crate::forms::{
    coordinate, non_negative_amount, optional_text, required_text, FieldErrors, INVALID_CHOICE,
    REQUIRED,
};

const NAME_MAX: usize = 100;
const COST_DIGITS: u32 = 10;
const TEXT_MAX: usize = 5_000;

/// Create or edit payload for a water source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WaterSourceForm {
    pub name: Option<String>,
    pub source_type: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub status: Option<String>,
    pub is_verified: Option<bool>,
    pub description: Option<String>,
    pub installation_date: Option<NaiveDate>,
}

/// Cleaned source fields; `None` means "not supplied".
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInput {
    pub name: String,
    pub source_type: SourceType,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub status: Option<SourceStatus>,
    pub is_verified: Option<bool>,
    pub description: String,
    pub installation_date: Option<NaiveDate>,
}

impl WaterSourceForm {
    pub fn clean(&self) -> Result<SourceInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", self.name.as_deref(), NAME_MAX);
        let source_type = match self.source_type.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("source_type", REQUIRED);
                None
            }
            Some(raw) => {
                let parsed = SourceType::parse(raw);
                if parsed.is_none() {
                    errors.add("source_type", INVALID_CHOICE);
                }
                parsed
            }
        };
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = SourceStatus::parse(raw);
                if parsed.is_none() {
                    errors.add("status", INVALID_CHOICE);
                }
                parsed
            }
        };
        let latitude = required_coordinate(&mut errors, "latitude", self.latitude, 90);
        let longitude = required_coordinate(&mut errors, "longitude", self.longitude, 180);
        let description =
            optional_text(&mut errors, "description", self.description.as_deref(), TEXT_MAX);

        if !errors.is_empty() {
            return Err(errors);
        }
        match (source_type, latitude, longitude) {
            (Some(source_type), Some(latitude), Some(longitude)) => Ok(SourceInput {
                name,
                source_type,
                latitude,
                longitude,
                status,
                is_verified: self.is_verified,
                description,
                installation_date: self.installation_date,
            }),
            _ => Err(errors),
        }
    }
}

fn required_coordinate(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<Decimal>,
    limit: i64,
) -> Option<Decimal> {
    if value.is_none() {
        errors.add(field, REQUIRED);
        return None;
    }
    coordinate(errors, field, value, limit)
}

/// Issue report submitted by a resident, possibly anonymous.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssueReportForm {
    pub water_source: Option<u64>,
    pub description: Option<String>,
    pub priority_level: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueInput {
    pub source_id: SourceId,
    pub description: String,
    pub priority: Priority,
}

impl IssueReportForm {
    pub fn clean(&self) -> Result<IssueInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.water_source.is_none() {
            errors.add("water_source", REQUIRED);
        }
        let description =
            required_text(&mut errors, "description", self.description.as_deref(), TEXT_MAX);
        let priority = match self.priority_level {
            None => Priority::default(),
            Some(level) => Priority::from_level(level).unwrap_or_else(|| {
                errors.add("priority_level", INVALID_CHOICE);
                Priority::default()
            }),
        };

        let source_id = SourceId(self.water_source.unwrap_or_default());
        errors.finish(|| IssueInput {
            source_id,
            description,
            priority,
        })
    }
}

/// Repair performed by the requesting technician.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepairLogForm {
    pub work_done: Option<String>,
    pub cost: Option<Decimal>,
    pub repair_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairInput {
    pub work_done: String,
    pub cost: Option<Decimal>,
    pub repair_date: Option<NaiveDate>,
}

impl RepairLogForm {
    pub fn clean(&self) -> Result<RepairInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let work_done = required_text(&mut errors, "work_done", self.work_done.as_deref(), TEXT_MAX);
        let cost = self.cost.map(|cost| {
            non_negative_amount(
                &mut errors,
                "cost",
                cost,
                COST_DIGITS,
                "Repair cost cannot be negative.",
            )
        });

        errors.finish(|| RepairInput {
            work_done,
            cost,
            repair_date: self.repair_date,
        })
    }
}

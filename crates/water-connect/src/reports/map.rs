use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::marketplace::WaterVendor;
use crate::registry::WaterSource;

const VENDOR_STATUS: &str = "Water Vendor";
const VENDOR_COLOR: &str = "primary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Source,
    Vendor,
}

/// One marker on the public map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub kind: MarkerKind,
    pub id: u64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub status: &'static str,
    pub color: &'static str,
}

/// Every source, then public vendors that have coordinates.
pub fn map_points(sources: &[WaterSource], vendors: &[WaterVendor]) -> Vec<MapPoint> {
    let source_points = sources.iter().filter_map(|source| {
        Some(MapPoint {
            kind: MarkerKind::Source,
            id: source.id.0,
            name: source.name.clone(),
            lat: degrees(source.latitude)?,
            lon: degrees(source.longitude)?,
            status: source.status.label(),
            color: source.status.color(),
        })
    });

    let vendor_points = vendors
        .iter()
        .filter(|vendor| vendor.is_public())
        .filter_map(|vendor| {
            Some(MapPoint {
                kind: MarkerKind::Vendor,
                id: vendor.id.0,
                name: vendor.business_name.clone(),
                lat: degrees(vendor.latitude?)?,
                lon: degrees(vendor.longitude?)?,
                status: VENDOR_STATUS,
                color: VENDOR_COLOR,
            })
        });

    source_points.chain(vendor_points).collect()
}

fn degrees(value: Decimal) -> Option<f64> {
    value.to_f64()
}

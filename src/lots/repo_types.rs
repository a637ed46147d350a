use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ParkingError;

/// Spot state. Stored as a single letter: `A` or `O`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    pub fn code(self) -> &'static str {
        match self {
            SpotStatus::Available => "A",
            SpotStatus::Occupied => "O",
        }
    }
}

impl TryFrom<&str> for SpotStatus {
    type Error = ParkingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "A" => Ok(SpotStatus::Available),
            "O" => Ok(SpotStatus::Occupied),
            other => Err(ParkingError::Internal(anyhow::anyhow!(
                "unknown spot status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ParkingLot {
    pub id: Uuid,
    pub location_name: String,
    pub price: Decimal, // per hour
    pub address: String,
    pub pin_code: Option<String>,
    pub max_spots: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParkingSpot {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub spot_number: i32,
    pub status: SpotStatus,
}

impl ParkingSpot {
    pub fn is_occupied(&self) -> bool {
        self.status == SpotStatus::Occupied
    }
}

#[derive(Debug, FromRow)]
pub struct SpotRow {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub spot_number: i32,
    pub status: String,
}

impl TryFrom<SpotRow> for ParkingSpot {
    type Error = ParkingError;

    fn try_from(row: SpotRow) -> Result<Self, Self::Error> {
        Ok(ParkingSpot {
            status: SpotStatus::try_from(row.status.as_str())?,
            id: row.id,
            lot_id: row.lot_id,
            spot_number: row.spot_number,
        })
    }
}

/// Validated lot fields, used both to create a lot and to edit one.
#[derive(Debug, Clone, PartialEq)]
pub struct LotFields {
    pub location_name: String,
    pub price: Decimal,
    pub address: String,
    pub pin_code: Option<String>,
    pub max_spots: i32,
}

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One occupancy of a spot. `leaving_time == None` means the car is still
/// parked.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub spot_id: Option<Uuid>, // None once the lot has been deleted
    #[serde(with = "time::serde::rfc3339")]
    pub parking_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub leaving_time: Option<OffsetDateTime>,
    pub cost_per_hour: Decimal, // lot price when the spot was reserved
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.leaving_time.is_none()
    }
}

/// Reservation joined with who made it and where.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReservationDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub reservation: Reservation,
    pub username: String,
    pub spot_number: Option<i32>,
    pub lot_id: Option<Uuid>,
    pub lot_name: Option<String>,
}

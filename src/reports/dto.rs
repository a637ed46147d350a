use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::lots::repo_types::{ParkingLot, ParkingSpot};
use crate::reservations::repo_types::ReservationDetail;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Occupancy {
    pub total_lots: usize,
    pub total_spots: usize,
    pub occupied_spots: usize,
    pub available_spots: usize,
}

#[derive(Debug, Serialize)]
pub struct CostedReservation {
    #[serde(flatten)]
    pub detail: ReservationDetail,
    /// `None` while the reservation is active.
    pub total_cost: Option<Decimal>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DateCost {
    pub date: String,  // ISO date
    pub label: String, // e.g. "05-Mar"
    pub cost: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CostReport {
    pub reservations: Vec<CostedReservation>,
    pub total_cost: Decimal,
    pub cost_by_date: Vec<DateCost>,
}

#[derive(Debug, Serialize)]
pub struct LotAvailability {
    #[serde(flatten)]
    pub lot: ParkingLot,
    pub available_spots: usize,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub lots: Vec<LotAvailability>,
    pub active_reservations: Vec<ReservationDetail>,
    /// Active reservation per lot id.
    pub reservation_map: BTreeMap<Uuid, ReservationDetail>,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub reservations: usize,
    pub total_cost: Decimal,
    pub cost_by_date: Vec<DateCost>,
}

#[derive(Debug, Serialize)]
pub struct SpotOverview {
    #[serde(flatten)]
    pub spot: ParkingSpot,
    pub latest_reservation: Option<ReservationDetail>,
}

#[derive(Debug, Serialize)]
pub struct LotOverview {
    #[serde(flatten)]
    pub lot: ParkingLot,
    pub occupied_spots: usize,
    pub available_spots: usize,
    pub spots: Vec<SpotOverview>,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub users: Vec<PublicUser>,
    pub lots: Vec<LotOverview>,
    pub summary: Occupancy,
}

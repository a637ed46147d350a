use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use time::{macros::format_description, Date};
use uuid::Uuid;

use super::dto::{
    AdminDashboard, CostReport, CostedReservation, DateCost, LotAvailability, LotOverview,
    Occupancy, SpotOverview, UserDashboard, UserSummary,
};
use crate::auth::{dto::PublicUser, repo_types::Role};
use crate::error::{ParkingError, ParkingResult};
use crate::lots::repo_types::{ParkingLot, ParkingSpot};
use crate::reservations::{repo_types::ReservationDetail, services::report_cost};
use crate::store::ParkingStore;

pub fn occupancy(lots: &[ParkingLot], spots: &[ParkingSpot]) -> Occupancy {
    let occupied_spots = spots.iter().filter(|s| s.is_occupied()).count();
    Occupancy {
        total_lots: lots.len(),
        total_spots: spots.len(),
        occupied_spots,
        available_spots: spots.len() - occupied_spots,
    }
}

fn day_label(date: Date) -> String {
    let fmt = format_description!("[day]-[month repr:short]");
    date.format(&fmt).unwrap_or_else(|_| date.to_string())
}

/// Price every closed reservation with the report floor, total them, and
/// bucket the totals by the day parking started.
pub fn cost_report(details: Vec<ReservationDetail>) -> ParkingResult<CostReport> {
    let mut total_cost = Decimal::ZERO;
    let mut by_date: BTreeMap<Date, Decimal> = BTreeMap::new();
    let mut reservations = Vec::with_capacity(details.len());

    for detail in details {
        let cost = report_cost(&detail.reservation)?;
        if let Some(cost) = cost {
            total_cost = add_cost(total_cost, cost)?;
            let day = by_date
                .entry(detail.reservation.parking_time.date())
                .or_default();
            *day = add_cost(*day, cost)?;
        }
        reservations.push(CostedReservation {
            detail,
            total_cost: cost,
        });
    }

    Ok(CostReport {
        reservations,
        total_cost: total_cost.round_dp(2),
        cost_by_date: by_date
            .into_iter()
            .map(|(date, cost)| DateCost {
                date: date.to_string(),
                label: day_label(date),
                cost,
            })
            .collect(),
    })
}

fn add_cost(total: Decimal, cost: Decimal) -> ParkingResult<Decimal> {
    total
        .checked_add(cost)
        .ok_or_else(|| ParkingError::Internal(anyhow::anyhow!("cost total overflow")))
}

pub async fn user_dashboard(store: &dyn ParkingStore, user_id: Uuid) -> ParkingResult<UserDashboard> {
    let lots = store.list_lots().await?;
    let spots = store.list_spots(None).await?;
    let active_reservations: Vec<ReservationDetail> = store
        .list_reservations(Some(user_id))
        .await?
        .into_iter()
        .filter(|r| r.reservation.is_active())
        .collect();

    let mut free: HashMap<Uuid, usize> = HashMap::new();
    for spot in spots.iter().filter(|s| !s.is_occupied()) {
        *free.entry(spot.lot_id).or_default() += 1;
    }

    let reservation_map = active_reservations
        .iter()
        .filter_map(|r| r.lot_id.map(|lot_id| (lot_id, r.clone())))
        .collect();

    Ok(UserDashboard {
        lots: lots
            .into_iter()
            .map(|lot| LotAvailability {
                available_spots: free.get(&lot.id).copied().unwrap_or(0),
                lot,
            })
            .collect(),
        active_reservations,
        reservation_map,
    })
}

pub async fn user_history(store: &dyn ParkingStore, user_id: Uuid) -> ParkingResult<CostReport> {
    cost_report(store.list_reservations(Some(user_id)).await?)
}

pub async fn user_summary(store: &dyn ParkingStore, user_id: Uuid) -> ParkingResult<UserSummary> {
    let report = user_history(store, user_id).await?;
    Ok(UserSummary {
        reservations: report.reservations.len(),
        total_cost: report.total_cost,
        cost_by_date: report.cost_by_date,
    })
}

pub async fn admin_users(store: &dyn ParkingStore) -> ParkingResult<Vec<PublicUser>> {
    Ok(store
        .list_users(Role::User)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect())
}

pub async fn admin_summary(store: &dyn ParkingStore) -> ParkingResult<Occupancy> {
    let lots = store.list_lots().await?;
    let spots = store.list_spots(None).await?;
    Ok(occupancy(&lots, &spots))
}

pub async fn admin_dashboard(store: &dyn ParkingStore) -> ParkingResult<AdminDashboard> {
    let users = admin_users(store).await?;
    let lots = store.list_lots().await?;
    let spots = store.list_spots(None).await?;
    let summary = occupancy(&lots, &spots);

    // newest first, so the first one seen per spot is the latest
    let mut latest: HashMap<Uuid, ReservationDetail> = HashMap::new();
    for r in store.list_reservations(None).await? {
        if let Some(spot_id) = r.reservation.spot_id {
            latest.entry(spot_id).or_insert(r);
        }
    }

    let mut by_lot: HashMap<Uuid, Vec<SpotOverview>> = HashMap::new();
    for spot in spots {
        let latest_reservation = latest.remove(&spot.id);
        by_lot.entry(spot.lot_id).or_default().push(SpotOverview {
            spot,
            latest_reservation,
        });
    }

    let lots = lots
        .into_iter()
        .map(|lot| {
            let spots = by_lot.remove(&lot.id).unwrap_or_default();
            let occupied_spots = spots.iter().filter(|s| s.spot.is_occupied()).count();
            LotOverview {
                available_spots: spots.len() - occupied_spots,
                occupied_spots,
                spots,
                lot,
            }
        })
        .collect();

    Ok(AdminDashboard {
        users,
        lots,
        summary,
    })
}

pub async fn all_reservations(store: &dyn ParkingStore) -> ParkingResult<CostReport> {
    cost_report(store.list_reservations(None).await?)
}

use rust_decimal::{Decimal, RoundingStrategy};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo_types::Reservation;
use crate::error::{ParkingError, ParkingResult};
use crate::store::ParkingStore;

/// Minimum billed time when a driver vacates a spot.
pub const VACATE_MIN_HOURS: Decimal = Decimal::ONE;

/// Minimum billed time used by dashboards, history and summaries.
///
/// Not the same as [`VACATE_MIN_HOURS`]; keep the two separate.
pub const REPORT_MIN_HOURS: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Hours between two instants, never negative.
pub fn elapsed_hours(start: OffsetDateTime, end: OffsetDateTime) -> Decimal {
    let millis = (end - start).whole_milliseconds().max(0);
    let millis = i64::try_from(millis).unwrap_or(i64::MAX);
    Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR)
}

fn billed(hours: Decimal, floor: Decimal, rate: Decimal) -> ParkingResult<Decimal> {
    let cost = hours.max(floor).checked_mul(rate).ok_or_else(|| {
        ParkingError::Internal(anyhow::anyhow!("cost overflow: {hours} h at {rate}/h"))
    })?;
    Ok(cost.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Amount charged at vacate time.
pub fn vacate_cost(
    start: OffsetDateTime,
    end: OffsetDateTime,
    rate: Decimal,
) -> ParkingResult<Decimal> {
    billed(elapsed_hours(start, end), VACATE_MIN_HOURS, rate)
}

/// Amount shown in reports for a closed reservation; `None` while active.
pub fn report_cost(reservation: &Reservation) -> ParkingResult<Option<Decimal>> {
    reservation
        .leaving_time
        .map(|end| {
            billed(
                elapsed_hours(reservation.parking_time, end),
                REPORT_MIN_HOURS,
                reservation.cost_per_hour,
            )
        })
        .transpose()
}

/// A closed reservation and what the driver owes for it.
#[derive(Debug, Clone)]
pub struct VacateReceipt {
    pub reservation: Reservation,
    pub total_cost: Decimal,
}

#[instrument(skip(store))]
pub async fn reserve(
    store: &dyn ParkingStore,
    lot_id: Uuid,
    user_id: Uuid,
) -> ParkingResult<Reservation> {
    let reservation = store
        .reserve(lot_id, user_id, OffsetDateTime::now_utc())
        .await?;
    info!(
        reservation_id = %reservation.id,
        spot_id = ?reservation.spot_id,
        rate = %reservation.cost_per_hour,
        "spot reserved"
    );
    Ok(reservation)
}

#[instrument(skip(store))]
pub async fn vacate(
    store: &dyn ParkingStore,
    reservation_id: Uuid,
    user_id: Uuid,
) -> ParkingResult<VacateReceipt> {
    let reservation = store
        .vacate(reservation_id, user_id, OffsetDateTime::now_utc())
        .await?;
    let leaving_time = reservation.leaving_time.ok_or_else(|| {
        ParkingError::Internal(anyhow::anyhow!(
            "reservation {reservation_id} still open after vacate"
        ))
    })?;
    let total_cost = vacate_cost(
        reservation.parking_time,
        leaving_time,
        reservation.cost_per_hour,
    )?;
    info!(%reservation_id, %total_cost, "spot vacated");
    Ok(VacateReceipt {
        reservation,
        total_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lots::repo_types::{LotFields, SpotStatus};
    use crate::store::memory::{tests::seed_user, MemoryStore};
    use time::Duration;

    fn at(minutes: i64) -> (OffsetDateTime, OffsetDateTime) {
        let start = OffsetDateTime::now_utc();
        (start, start + Duration::minutes(minutes))
    }

    fn closed(minutes: i64, rate: Decimal) -> Reservation {
        let (start, end) = at(minutes);
        Reservation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            spot_id: None,
            parking_time: start,
            leaving_time: Some(end),
            cost_per_hour: rate,
        }
    }

    async fn lot_with(store: &MemoryStore, spots: i32, price: Decimal) -> Uuid {
        store
            .create_lot(LotFields {
                location_name: "Central".into(),
                price,
                address: String::new(),
                pin_code: None,
                max_spots: spots,
            })
            .await
            .expect("lot")
            .id
    }

    #[test]
    fn ninety_minutes_costs_the_same_on_both_paths() {
        let rate = Decimal::new(10, 0);
        let (start, end) = at(90);
        assert_eq!(vacate_cost(start, end, rate).expect("cost"), Decimal::new(1500, 2));
        assert_eq!(report_cost(&closed(90, rate)).expect("cost"), Some(Decimal::new(1500, 2)));
    }

    #[test]
    fn half_hour_shows_floor_divergence() {
        let rate = Decimal::new(10, 0);
        let (start, end) = at(30);
        assert_eq!(vacate_cost(start, end, rate).expect("cost"), Decimal::new(10, 0));
        assert_eq!(report_cost(&closed(30, rate)).expect("cost"), Some(Decimal::new(5, 0)));
    }

    #[test]
    fn report_floor_is_a_quarter_hour() {
        let rate = Decimal::new(20, 0);
        assert_eq!(report_cost(&closed(1, rate)).expect("cost"), Some(Decimal::new(5, 0)));
    }

    #[test]
    fn rounds_to_cents() {
        let rate = Decimal::new(999, 2); // 9.99/h
        let (start, end) = at(100); // 1h40m
        assert_eq!(vacate_cost(start, end, rate).expect("cost"), Decimal::new(1665, 2));
    }

    #[test]
    fn active_reservation_has_no_report_cost() {
        let mut r = closed(60, Decimal::ONE);
        r.leaving_time = None;
        assert_eq!(report_cost(&r).expect("cost"), None);
    }

    #[test]
    fn oversized_rate_is_an_error_not_a_panic() {
        let r = closed(90, Decimal::MAX);
        assert!(matches!(report_cost(&r), Err(ParkingError::Internal(_))));
        let (start, end) = at(90);
        assert!(matches!(
            vacate_cost(start, end, Decimal::MAX),
            Err(ParkingError::Internal(_))
        ));
    }

    #[test]
    fn clock_skew_never_goes_negative() {
        let (start, end) = at(-10);
        assert_eq!(elapsed_hours(start, end), Decimal::ZERO);
    }

    #[tokio::test]
    async fn reserving_past_capacity_fails() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "driver").await;
        let lot_id = lot_with(&store, 3, Decimal::new(10, 0)).await;

        for _ in 0..3 {
            reserve(&store, lot_id, user.id).await.expect("spot left");
        }
        let err = reserve(&store, lot_id, user.id).await.unwrap_err();
        assert!(matches!(err, ParkingError::NoAvailability));
        assert_eq!(store.list_reservations(None).await.expect("list").len(), 3);
    }

    #[tokio::test]
    async fn reserve_takes_lowest_free_spot_and_snapshots_price() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "driver").await;
        let lot_id = lot_with(&store, 2, Decimal::new(1250, 2)).await;

        let r = reserve(&store, lot_id, user.id).await.expect("reserve");
        assert_eq!(r.cost_per_hour, Decimal::new(1250, 2));
        let spots = store.list_spots(Some(lot_id)).await.expect("spots");
        let taken = spots.iter().find(|s| Some(s.id) == r.spot_id).expect("spot");
        assert_eq!(taken.spot_number, 1);
        assert_eq!(taken.status, SpotStatus::Occupied);
    }

    #[tokio::test]
    async fn reserve_in_unknown_lot_is_not_found() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "driver").await;
        let err = reserve(&store, Uuid::new_v4(), user.id).await.unwrap_err();
        assert!(matches!(err, ParkingError::NotFound(_)));
    }

    #[tokio::test]
    async fn vacate_frees_spot_and_closes_reservation() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "driver").await;
        let lot_id = lot_with(&store, 1, Decimal::new(10, 0)).await;
        let r = reserve(&store, lot_id, user.id).await.expect("reserve");

        let receipt = vacate(&store, r.id, user.id).await.expect("vacate");
        // just reserved, so the one-hour minimum applies
        assert_eq!(receipt.total_cost, Decimal::new(10, 0));

        let spots = store.list_spots(Some(lot_id)).await.expect("spots");
        assert_eq!(spots[0].status, SpotStatus::Available);
        let all = store.list_reservations(None).await.expect("list");
        assert_eq!(all.len(), 1);
        assert!(!all[0].reservation.is_active());
    }

    #[tokio::test]
    async fn vacate_checks_owner_and_state() {
        let store = MemoryStore::new();
        let owner = seed_user(&store, "owner").await;
        let other = seed_user(&store, "other").await;
        let lot_id = lot_with(&store, 1, Decimal::new(10, 0)).await;
        let r = reserve(&store, lot_id, owner.id).await.expect("reserve");

        let err = vacate(&store, r.id, other.id).await.unwrap_err();
        assert!(matches!(err, ParkingError::Unauthorized));
        let spots = store.list_spots(Some(lot_id)).await.expect("spots");
        assert_eq!(spots[0].status, SpotStatus::Occupied);

        vacate(&store, r.id, owner.id).await.expect("vacate");
        let err = vacate(&store, r.id, owner.id).await.unwrap_err();
        assert!(matches!(err, ParkingError::AlreadyVacated));

        let err = vacate(&store, Uuid::new_v4(), owner.id).await.unwrap_err();
        assert!(matches!(err, ParkingError::NotFound(_)));
    }
}

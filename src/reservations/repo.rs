use rust_decimal::Decimal;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Reservation, ReservationDetail};
use crate::error::{ParkingError, ParkingResult};
use crate::lots::repo_types::SpotStatus;

const RESERVATION_COLUMNS: &str = "id, user_id, spot_id, parking_time, leaving_time, cost_per_hour";

/// Occupy the lowest-numbered free spot of a lot.
///
/// `SKIP LOCKED` lets two concurrent reservations in the same lot pick
/// different spots instead of queueing on the same row.
pub async fn reserve(
    db: &PgPool,
    lot_id: Uuid,
    user_id: Uuid,
    at: OffsetDateTime,
) -> ParkingResult<Reservation> {
    let mut tx = db.begin().await?;

    let price = sqlx::query_scalar::<_, Decimal>("SELECT price FROM parking_lots WHERE id = $1")
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ParkingError::NotFound("parking lot"))?;

    let spot_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM parking_spots
        WHERE lot_id = $1 AND status = $2
        ORDER BY spot_number
        LIMIT 1
        FOR UPDATE SKIP LOCKED
        "#,
    )
    .bind(lot_id)
    .bind(SpotStatus::Available.code())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ParkingError::NoAvailability)?;

    sqlx::query("UPDATE parking_spots SET status = $2 WHERE id = $1")
        .bind(spot_id)
        .bind(SpotStatus::Occupied.code())
        .execute(&mut *tx)
        .await?;

    let reservation = sqlx::query_as::<_, Reservation>(&format!(
        r#"
        INSERT INTO reservations (id, user_id, spot_id, parking_time, cost_per_hour)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {RESERVATION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(spot_id)
    .bind(at)
    .bind(price)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(reservation)
}

/// Close a reservation owned by `user_id` and free its spot.
pub async fn vacate(
    db: &PgPool,
    reservation_id: Uuid,
    user_id: Uuid,
    at: OffsetDateTime,
) -> ParkingResult<Reservation> {
    let mut tx = db.begin().await?;

    let current = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE"
    ))
    .bind(reservation_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ParkingError::NotFound("reservation"))?;

    if current.user_id != user_id {
        return Err(ParkingError::Unauthorized);
    }
    if !current.is_active() {
        return Err(ParkingError::AlreadyVacated);
    }

    let closed = sqlx::query_as::<_, Reservation>(&format!(
        "UPDATE reservations SET leaving_time = $2 WHERE id = $1 RETURNING {RESERVATION_COLUMNS}"
    ))
    .bind(reservation_id)
    .bind(at)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(spot_id) = closed.spot_id {
        sqlx::query("UPDATE parking_spots SET status = $2 WHERE id = $1")
            .bind(spot_id)
            .bind(SpotStatus::Available.code())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(closed)
}

/// Reservations newest first, optionally only those of one user.
pub async fn list_details(
    db: &PgPool,
    user_id: Option<Uuid>,
) -> ParkingResult<Vec<ReservationDetail>> {
    let rows = sqlx::query_as::<_, ReservationDetail>(
        r#"
        SELECT r.id, r.user_id, r.spot_id, r.parking_time, r.leaving_time, r.cost_per_hour,
               u.username, s.spot_number, s.lot_id, l.location_name AS lot_name
        FROM reservations AS r
        INNER JOIN users AS u ON u.id = r.user_id
        LEFT JOIN parking_spots AS s ON s.id = r.spot_id
        LEFT JOIN parking_lots AS l ON l.id = s.lot_id
        WHERE $1::uuid IS NULL OR r.user_id = $1
        ORDER BY r.parking_time DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

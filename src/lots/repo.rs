use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{LotFields, ParkingLot, ParkingSpot, SpotRow, SpotStatus};
use super::services::plan_resize;
use crate::error::{ParkingError, ParkingResult};

const LOT_COLUMNS: &str = "id, location_name, price, address, pin_code, max_spots";

pub async fn find_by_id(db: &PgPool, lot_id: Uuid) -> ParkingResult<Option<ParkingLot>> {
    let lot = sqlx::query_as::<_, ParkingLot>(&format!(
        "SELECT {LOT_COLUMNS} FROM parking_lots WHERE id = $1"
    ))
    .bind(lot_id)
    .fetch_optional(db)
    .await?;
    Ok(lot)
}

pub async fn list_all(db: &PgPool) -> ParkingResult<Vec<ParkingLot>> {
    let lots = sqlx::query_as::<_, ParkingLot>(&format!(
        "SELECT {LOT_COLUMNS} FROM parking_lots ORDER BY created_at, location_name"
    ))
    .fetch_all(db)
    .await?;
    Ok(lots)
}

/// Spots of one lot, or of every lot, ordered by lot then spot number.
pub async fn list_spots(db: &PgPool, lot_id: Option<Uuid>) -> ParkingResult<Vec<ParkingSpot>> {
    let rows = sqlx::query_as::<_, SpotRow>(
        r#"
        SELECT id, lot_id, spot_number, status
        FROM parking_spots
        WHERE $1::uuid IS NULL OR lot_id = $1
        ORDER BY lot_id, spot_number
        "#,
    )
    .bind(lot_id)
    .fetch_all(db)
    .await?;
    rows.into_iter().map(ParkingSpot::try_from).collect()
}

/// Insert a lot together with spots `1..=max_spots`, all available.
pub async fn create(db: &PgPool, values: LotFields) -> ParkingResult<ParkingLot> {
    let mut tx = db.begin().await?;

    let lot = sqlx::query_as::<_, ParkingLot>(&format!(
        r#"
        INSERT INTO parking_lots (id, location_name, price, address, pin_code, max_spots)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {LOT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&values.location_name)
    .bind(values.price)
    .bind(&values.address)
    .bind(&values.pin_code)
    .bind(values.max_spots)
    .fetch_one(&mut *tx)
    .await?;

    insert_spots(&mut tx, lot.id, (1..=values.max_spots).collect()).await?;

    tx.commit().await?;
    Ok(lot)
}

/// Apply an edit. The lot's spots are locked before the occupancy check so a
/// concurrent reservation cannot slip in between check and resize.
pub async fn update(db: &PgPool, lot_id: Uuid, values: LotFields) -> ParkingResult<ParkingLot> {
    let mut tx = db.begin().await?;

    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM parking_lots WHERE id = $1 FOR UPDATE")
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(ParkingError::NotFound("parking lot"));
    }

    let spots = lock_spots(&mut tx, lot_id).await?;
    let plan = plan_resize(&spots, values.max_spots)?;

    let lot = sqlx::query_as::<_, ParkingLot>(&format!(
        r#"
        UPDATE parking_lots
        SET location_name = $2, price = $3, address = $4, pin_code = $5, max_spots = $6
        WHERE id = $1
        RETURNING {LOT_COLUMNS}
        "#
    ))
    .bind(lot_id)
    .bind(&values.location_name)
    .bind(values.price)
    .bind(&values.address)
    .bind(&values.pin_code)
    .bind(values.max_spots)
    .fetch_one(&mut *tx)
    .await?;

    insert_spots(&mut tx, lot_id, plan.add).await?;
    if !plan.remove.is_empty() {
        sqlx::query("DELETE FROM parking_spots WHERE id = ANY($1)")
            .bind(&plan.remove)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(lot)
}

/// Delete a lot and its spots, refusing while any spot is occupied.
pub async fn delete(db: &PgPool, lot_id: Uuid) -> ParkingResult<()> {
    let mut tx = db.begin().await?;

    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM parking_lots WHERE id = $1 FOR UPDATE")
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(ParkingError::NotFound("parking lot"));
    }

    let spots = lock_spots(&mut tx, lot_id).await?;
    if spots.iter().any(ParkingSpot::is_occupied) {
        return Err(ParkingError::DeleteWhileOccupied);
    }

    sqlx::query("DELETE FROM parking_spots WHERE lot_id = $1")
        .bind(lot_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM parking_lots WHERE id = $1")
        .bind(lot_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

async fn lock_spots(
    tx: &mut Transaction<'_, Postgres>,
    lot_id: Uuid,
) -> ParkingResult<Vec<ParkingSpot>> {
    let rows = sqlx::query_as::<_, SpotRow>(
        r#"
        SELECT id, lot_id, spot_number, status
        FROM parking_spots
        WHERE lot_id = $1
        ORDER BY spot_number
        FOR UPDATE
        "#,
    )
    .bind(lot_id)
    .fetch_all(&mut **tx)
    .await?;
    rows.into_iter().map(ParkingSpot::try_from).collect()
}

async fn insert_spots(
    tx: &mut Transaction<'_, Postgres>,
    lot_id: Uuid,
    numbers: Vec<i32>,
) -> ParkingResult<()> {
    if numbers.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = numbers.iter().map(|_| Uuid::new_v4()).collect();
    sqlx::query(
        r#"
        INSERT INTO parking_spots (id, lot_id, spot_number, status)
        SELECT spot_id, $2, spot_number, $4
        FROM UNNEST($1::uuid[], $3::int4[]) AS s(spot_id, spot_number)
        "#,
    )
    .bind(&ids)
    .bind(lot_id)
    .bind(&numbers)
    .bind(SpotStatus::Available.code())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

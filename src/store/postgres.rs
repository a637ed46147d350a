use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::ParkingStore;
use crate::auth::{
    self,
    repo_types::{NewUser, Role, User},
};
use crate::error::ParkingResult;
use crate::lots::{
    self,
    repo_types::{LotFields, ParkingLot, ParkingSpot},
};
use crate::reservations::{
    self,
    repo_types::{Reservation, ReservationDetail},
};

/// PostgreSQL-backed store; each feature's `repo` module holds the queries.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ParkingStore for PgStore {
    async fn create_user(&self, new: NewUser) -> ParkingResult<User> {
        auth::repo::create(&self.db, new).await
    }

    async fn find_user_by_username(&self, username: &str) -> ParkingResult<Option<User>> {
        auth::repo::find_by_username(&self.db, username).await
    }

    async fn find_user(&self, id: Uuid) -> ParkingResult<Option<User>> {
        auth::repo::find_by_id(&self.db, id).await
    }

    async fn list_users(&self, role: Role) -> ParkingResult<Vec<User>> {
        auth::repo::list_by_role(&self.db, role).await
    }

    async fn create_lot(&self, values: LotFields) -> ParkingResult<ParkingLot> {
        lots::repo::create(&self.db, values).await
    }

    async fn find_lot(&self, id: Uuid) -> ParkingResult<Option<ParkingLot>> {
        lots::repo::find_by_id(&self.db, id).await
    }

    async fn list_lots(&self) -> ParkingResult<Vec<ParkingLot>> {
        lots::repo::list_all(&self.db).await
    }

    async fn list_spots(&self, lot_id: Option<Uuid>) -> ParkingResult<Vec<ParkingSpot>> {
        lots::repo::list_spots(&self.db, lot_id).await
    }

    async fn update_lot(&self, id: Uuid, values: LotFields) -> ParkingResult<ParkingLot> {
        lots::repo::update(&self.db, id, values).await
    }

    async fn delete_lot(&self, id: Uuid) -> ParkingResult<()> {
        lots::repo::delete(&self.db, id).await
    }

    async fn reserve(
        &self,
        lot_id: Uuid,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> ParkingResult<Reservation> {
        reservations::repo::reserve(&self.db, lot_id, user_id, at).await
    }

    async fn vacate(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> ParkingResult<Reservation> {
        reservations::repo::vacate(&self.db, reservation_id, user_id, at).await
    }

    async fn list_reservations(
        &self,
        user_id: Option<Uuid>,
    ) -> ParkingResult<Vec<ReservationDetail>> {
        reservations::repo::list_details(&self.db, user_id).await
    }
}

use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Role, User};
use crate::error::ParkingResult;
use crate::lots::repo_types::{LotFields, ParkingLot, ParkingSpot};
use crate::reservations::repo_types::{Reservation, ReservationDetail};

pub mod memory;
pub mod postgres;

/// Persistence for users, lots, spots and reservations.
///
/// Every mutating method is atomic: it either applies all of its changes or
/// none of them.
#[async_trait]
pub trait ParkingStore: Send + Sync {
    async fn create_user(&self, new: NewUser) -> ParkingResult<User>;
    async fn find_user_by_username(&self, username: &str) -> ParkingResult<Option<User>>;
    async fn find_user(&self, id: Uuid) -> ParkingResult<Option<User>>;
    async fn list_users(&self, role: Role) -> ParkingResult<Vec<User>>;

    /// Create a lot with spots numbered `1..=max_spots`, all available.
    async fn create_lot(&self, values: LotFields) -> ParkingResult<ParkingLot>;
    async fn find_lot(&self, id: Uuid) -> ParkingResult<Option<ParkingLot>>;
    async fn list_lots(&self) -> ParkingResult<Vec<ParkingLot>>;
    /// Spots of one lot, or of all lots, by lot then spot number.
    async fn list_spots(&self, lot_id: Option<Uuid>) -> ParkingResult<Vec<ParkingSpot>>;
    /// Update lot fields and resize its spots per `lots::services::plan_resize`.
    async fn update_lot(&self, id: Uuid, values: LotFields) -> ParkingResult<ParkingLot>;
    async fn delete_lot(&self, id: Uuid) -> ParkingResult<()>;

    /// Occupy the first available spot of a lot.
    async fn reserve(
        &self,
        lot_id: Uuid,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> ParkingResult<Reservation>;
    /// Close an active reservation owned by `user_id` and free its spot.
    async fn vacate(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> ParkingResult<Reservation>;
    /// Newest first; `None` lists every user's reservations.
    async fn list_reservations(&self, user_id: Option<Uuid>)
        -> ParkingResult<Vec<ReservationDetail>>;
}

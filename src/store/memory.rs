use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ParkingStore;
use crate::auth::repo_types::{NewUser, Role, User};
use crate::error::{ParkingError, ParkingResult};
use crate::lots::repo_types::{LotFields, ParkingLot, ParkingSpot, SpotStatus};
use crate::lots::services::plan_resize;
use crate::reservations::repo_types::{Reservation, ReservationDetail};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    lots: Vec<ParkingLot>,
    spots: Vec<ParkingSpot>,
    reservations: Vec<Reservation>,
}

impl Tables {
    fn lot_position(&self, id: Uuid) -> Option<usize> {
        self.lots.iter().position(|l| l.id == id)
    }

    fn push_spots(&mut self, lot_id: Uuid, numbers: impl IntoIterator<Item = i32>) {
        self.spots.extend(numbers.into_iter().map(|spot_number| ParkingSpot {
            id: Uuid::new_v4(),
            lot_id,
            spot_number,
            status: SpotStatus::Available,
        }));
    }

    fn lot_spots(&self, lot_id: Uuid) -> Vec<ParkingSpot> {
        let mut spots: Vec<ParkingSpot> = self
            .spots
            .iter()
            .filter(|s| s.lot_id == lot_id)
            .cloned()
            .collect();
        spots.sort_by_key(|s| s.spot_number);
        spots
    }

    fn detail(&self, r: &Reservation) -> ReservationDetail {
        let spot = r
            .spot_id
            .and_then(|id| self.spots.iter().find(|s| s.id == id));
        let lot = spot.and_then(|s| self.lots.iter().find(|l| l.id == s.lot_id));
        ReservationDetail {
            reservation: r.clone(),
            username: self
                .users
                .iter()
                .find(|u| u.id == r.user_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            spot_number: spot.map(|s| s.spot_number),
            lot_id: spot.map(|s| s.lot_id),
            lot_name: lot.map(|l| l.location_name.clone()),
        }
    }
}

/// Store kept in process memory. Used by tests and by `DATABASE_URL=memory://`.
///
/// A single lock guards all tables, so every operation sees and leaves a
/// consistent snapshot.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParkingStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> ParkingResult<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(ParkingError::UsernameTaken);
        }
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(ParkingError::EmailTaken);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            pin_code: new.pin_code,
            phone_number: new.phone_number,
            vehicle_number: new.vehicle_number,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> ParkingResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user(&self, id: Uuid) -> ParkingResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&self, role: Role) -> ParkingResult<Vec<User>> {
        let t = self.tables.read().await;
        let mut users: Vec<User> = t.users.iter().filter(|u| u.role == role).cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn create_lot(&self, values: LotFields) -> ParkingResult<ParkingLot> {
        let mut t = self.tables.write().await;
        let lot = ParkingLot {
            id: Uuid::new_v4(),
            location_name: values.location_name,
            price: values.price,
            address: values.address,
            pin_code: values.pin_code,
            max_spots: values.max_spots,
        };
        t.lots.push(lot.clone());
        t.push_spots(lot.id, 1..=values.max_spots);
        Ok(lot)
    }

    async fn find_lot(&self, id: Uuid) -> ParkingResult<Option<ParkingLot>> {
        let t = self.tables.read().await;
        Ok(t.lots.iter().find(|l| l.id == id).cloned())
    }

    async fn list_lots(&self) -> ParkingResult<Vec<ParkingLot>> {
        Ok(self.tables.read().await.lots.clone())
    }

    async fn list_spots(&self, lot_id: Option<Uuid>) -> ParkingResult<Vec<ParkingSpot>> {
        let t = self.tables.read().await;
        Ok(match lot_id {
            Some(id) => t.lot_spots(id),
            None => t.lots.iter().flat_map(|l| t.lot_spots(l.id)).collect(),
        })
    }

    async fn update_lot(&self, id: Uuid, values: LotFields) -> ParkingResult<ParkingLot> {
        let mut t = self.tables.write().await;
        let pos = t
            .lot_position(id)
            .ok_or(ParkingError::NotFound("parking lot"))?;
        let plan = plan_resize(&t.lot_spots(id), values.max_spots)?;

        t.spots.retain(|s| !plan.remove.contains(&s.id));
        t.push_spots(id, plan.add);

        let lot = &mut t.lots[pos];
        lot.location_name = values.location_name;
        lot.price = values.price;
        lot.address = values.address;
        lot.pin_code = values.pin_code;
        lot.max_spots = values.max_spots;
        Ok(lot.clone())
    }

    async fn delete_lot(&self, id: Uuid) -> ParkingResult<()> {
        let mut t = self.tables.write().await;
        let pos = t
            .lot_position(id)
            .ok_or(ParkingError::NotFound("parking lot"))?;
        let spots = t.lot_spots(id);
        if spots.iter().any(ParkingSpot::is_occupied) {
            return Err(ParkingError::DeleteWhileOccupied);
        }

        let removed: Vec<Uuid> = spots.iter().map(|s| s.id).collect();
        for r in t.reservations.iter_mut() {
            if r.spot_id.is_some_and(|s| removed.contains(&s)) {
                r.spot_id = None;
            }
        }
        t.spots.retain(|s| s.lot_id != id);
        t.lots.remove(pos);
        Ok(())
    }

    async fn reserve(
        &self,
        lot_id: Uuid,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> ParkingResult<Reservation> {
        let mut t = self.tables.write().await;
        let pos = t
            .lot_position(lot_id)
            .ok_or(ParkingError::NotFound("parking lot"))?;
        let price = t.lots[pos].price;

        let spot_id = t
            .lot_spots(lot_id)
            .into_iter()
            .find(|s| !s.is_occupied())
            .map(|s| s.id)
            .ok_or(ParkingError::NoAvailability)?;
        if let Some(spot) = t.spots.iter_mut().find(|s| s.id == spot_id) {
            spot.status = SpotStatus::Occupied;
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            user_id,
            spot_id: Some(spot_id),
            parking_time: at,
            leaving_time: None,
            cost_per_hour: price,
        };
        t.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn vacate(
        &self,
        reservation_id: Uuid,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> ParkingResult<Reservation> {
        let mut t = self.tables.write().await;
        let reservation = t
            .reservations
            .iter_mut()
            .find(|r| r.id == reservation_id)
            .ok_or(ParkingError::NotFound("reservation"))?;
        if reservation.user_id != user_id {
            return Err(ParkingError::Unauthorized);
        }
        if !reservation.is_active() {
            return Err(ParkingError::AlreadyVacated);
        }
        reservation.leaving_time = Some(at);
        let closed = reservation.clone();

        if let Some(spot) = t.spots.iter_mut().find(|s| Some(s.id) == closed.spot_id) {
            spot.status = SpotStatus::Available;
        }
        Ok(closed)
    }

    async fn list_reservations(
        &self,
        user_id: Option<Uuid>,
    ) -> ParkingResult<Vec<ReservationDetail>> {
        let t = self.tables.read().await;
        let mut rows: Vec<ReservationDetail> = t
            .reservations
            .iter()
            .rev()
            .filter(|r| user_id.map_or(true, |id| r.user_id == id))
            .map(|r| t.detail(r))
            .collect();
        rows.sort_by(|a, b| b.reservation.parking_time.cmp(&a.reservation.parking_time));
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn seed_user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                password_hash: "unused".into(),
                role: Role::User,
                pin_code: None,
                phone_number: None,
                vehicle_number: None,
            })
            .await
            .expect("seed user")
    }

    fn lot(max_spots: i32) -> LotFields {
        LotFields {
            location_name: "Harbour".into(),
            price: rust_decimal::Decimal::new(5, 0),
            address: "Pier 3".into(),
            pin_code: Some("400001".into()),
            max_spots,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;
        let err = store
            .create_user(NewUser {
                username: "alice2".into(),
                email: "alice@example.com".into(),
                password_hash: "x".into(),
                role: Role::User,
                pin_code: None,
                phone_number: None,
                vehicle_number: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::EmailTaken));
    }

    #[tokio::test]
    async fn spot_is_occupied_iff_one_open_reservation() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let lot = store.create_lot(lot(2)).await.expect("lot");
        let now = OffsetDateTime::now_utc();

        let first = store.reserve(lot.id, user.id, now).await.expect("reserve");
        store.reserve(lot.id, user.id, now).await.expect("reserve");
        store.vacate(first.id, user.id, now).await.expect("vacate");

        let spots = store.list_spots(Some(lot.id)).await.expect("spots");
        let reservations = store.list_reservations(None).await.expect("list");
        for spot in &spots {
            let open = reservations
                .iter()
                .filter(|r| r.reservation.spot_id == Some(spot.id) && r.reservation.is_active())
                .count();
            assert_eq!(spot.is_occupied(), open == 1);
            assert!(open <= 1);
        }
    }

    #[tokio::test]
    async fn freed_spot_is_reused_first() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let lot = store.create_lot(lot(3)).await.expect("lot");
        let now = OffsetDateTime::now_utc();

        let one = store.reserve(lot.id, user.id, now).await.expect("1");
        store.reserve(lot.id, user.id, now).await.expect("2");
        store.vacate(one.id, user.id, now).await.expect("vacate");
        let again = store.reserve(lot.id, user.id, now).await.expect("again");
        assert_eq!(again.spot_id, one.spot_id);
    }

    #[tokio::test]
    async fn deleting_lot_keeps_history_without_spot() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let lot = store.create_lot(lot(1)).await.expect("lot");
        let now = OffsetDateTime::now_utc();
        let r = store.reserve(lot.id, user.id, now).await.expect("reserve");
        store.vacate(r.id, user.id, now).await.expect("vacate");

        store.delete_lot(lot.id).await.expect("delete");
        let history = store.list_reservations(Some(user.id)).await.expect("list");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reservation.spot_id, None);
        assert_eq!(history[0].lot_name, None);
        assert_eq!(history[0].username, "alice");
    }

    #[tokio::test]
    async fn shrink_then_grow_renumbers_from_highest() {
        let store = MemoryStore::new();
        let created = store.create_lot(lot(4)).await.expect("lot");
        store.update_lot(created.id, lot(2)).await.expect("shrink");
        store.update_lot(created.id, lot(3)).await.expect("grow");

        let numbers: Vec<i32> = store
            .list_spots(Some(created.id))
            .await
            .expect("spots")
            .iter()
            .map(|s| s.spot_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn history_is_filtered_and_newest_first() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let lot = store.create_lot(lot(3)).await.expect("lot");
        let t0 = OffsetDateTime::now_utc();

        store.reserve(lot.id, alice.id, t0).await.expect("a1");
        store.reserve(lot.id, bob.id, t0).await.expect("b1");
        let later = store
            .reserve(lot.id, alice.id, t0 + time::Duration::hours(1))
            .await
            .expect("a2");

        let mine = store.list_reservations(Some(alice.id)).await.expect("list");
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].reservation.id, later.id);
        assert_eq!(mine[0].lot_name.as_deref(), Some("Harbour"));
        assert_eq!(store.list_reservations(None).await.expect("all").len(), 3);
    }
}

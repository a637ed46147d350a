use tracing::{info, instrument};
use uuid::Uuid;

use super::repo_types::{LotFields, ParkingLot, ParkingSpot};
use crate::error::{ParkingError, ParkingResult};
use crate::store::ParkingStore;

/// Spot changes needed to bring a lot to a new capacity.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResizePlan {
    /// Spot numbers to create.
    pub add: Vec<i32>,
    /// Spot ids to delete.
    pub remove: Vec<Uuid>,
}

/// Work out how to resize a lot from its current spots.
///
/// Any occupied spot freezes the spot count: the request is rejected unless
/// the capacity stays the same. Growing appends numbers after the highest
/// existing one; shrinking drops the highest-numbered available spots.
pub fn plan_resize(spots: &[ParkingSpot], new_capacity: i32) -> ParkingResult<ResizePlan> {
    let current = spots.len();
    let target = usize::try_from(new_capacity)
        .map_err(|_| ParkingError::Validation("Number of spots cannot be negative".into()))?;

    if target != current && spots.iter().any(ParkingSpot::is_occupied) {
        return Err(ParkingError::ResizeWhileOccupied);
    }

    let mut plan = ResizePlan::default();
    if target > current {
        let highest = spots.iter().map(|s| s.spot_number).max().unwrap_or(0);
        plan.add = (1..=(target - current) as i32).map(|i| highest + i).collect();
    } else if target < current {
        let mut available: Vec<&ParkingSpot> = spots.iter().filter(|s| !s.is_occupied()).collect();
        available.sort_by(|a, b| b.spot_number.cmp(&a.spot_number));
        plan.remove = available
            .into_iter()
            .take(current - target)
            .map(|s| s.id)
            .collect();
    }
    Ok(plan)
}

#[instrument(skip(store))]
pub async fn add_lot(store: &dyn ParkingStore, values: LotFields) -> ParkingResult<ParkingLot> {
    let lot = store.create_lot(values).await?;
    info!(lot_id = %lot.id, spots = lot.max_spots, "parking lot created");
    Ok(lot)
}

#[instrument(skip(store))]
pub async fn edit_lot(
    store: &dyn ParkingStore,
    lot_id: Uuid,
    values: LotFields,
) -> ParkingResult<ParkingLot> {
    let lot = store.update_lot(lot_id, values).await?;
    info!(lot_id = %lot.id, spots = lot.max_spots, "parking lot updated");
    Ok(lot)
}

#[instrument(skip(store))]
pub async fn delete_lot(store: &dyn ParkingStore, lot_id: Uuid) -> ParkingResult<()> {
    store.delete_lot(lot_id).await?;
    info!(%lot_id, "parking lot deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lots::repo_types::SpotStatus;
    use crate::store::memory::MemoryStore;
    use rust_decimal::Decimal;
    use time::OffsetDateTime;

    fn spots(statuses: &[(i32, SpotStatus)]) -> Vec<ParkingSpot> {
        let lot_id = Uuid::new_v4();
        statuses
            .iter()
            .map(|&(spot_number, status)| ParkingSpot {
                id: Uuid::new_v4(),
                lot_id,
                spot_number,
                status,
            })
            .collect()
    }

    fn fields(max_spots: i32) -> LotFields {
        LotFields {
            location_name: "Central".into(),
            price: Decimal::new(10, 0),
            address: "1 Main St".into(),
            pin_code: None,
            max_spots,
        }
    }

    #[test]
    fn grow_appends_after_highest_number() {
        let current = spots(&[(1, SpotStatus::Available), (4, SpotStatus::Available)]);
        let plan = plan_resize(&current, 4).expect("plan");
        assert_eq!(plan.add, vec![5, 6]);
        assert!(plan.remove.is_empty());
    }

    #[test]
    fn shrink_drops_highest_numbers_first() {
        let current = spots(&[
            (3, SpotStatus::Available),
            (1, SpotStatus::Available),
            (2, SpotStatus::Available),
        ]);
        let plan = plan_resize(&current, 1).expect("plan");
        let removed: Vec<i32> = plan
            .remove
            .iter()
            .map(|id| current.iter().find(|s| s.id == *id).unwrap().spot_number)
            .collect();
        assert_eq!(removed, vec![3, 2]);
    }

    #[test]
    fn occupied_spot_blocks_capacity_change_only() {
        let current = spots(&[(1, SpotStatus::Occupied), (2, SpotStatus::Available)]);
        assert!(matches!(
            plan_resize(&current, 3),
            Err(ParkingError::ResizeWhileOccupied)
        ));
        assert!(matches!(
            plan_resize(&current, 1),
            Err(ParkingError::ResizeWhileOccupied)
        ));
        assert_eq!(
            plan_resize(&current, 2).expect("same size"),
            ResizePlan::default()
        );
    }

    #[test]
    fn empty_lot_grows_from_one() {
        let plan = plan_resize(&[], 3).expect("plan");
        assert_eq!(plan.add, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn add_lot_creates_numbered_available_spots() {
        let store = MemoryStore::new();
        let lot = add_lot(&store, fields(3)).await.expect("add");
        let spots = store.list_spots(Some(lot.id)).await.expect("spots");
        let numbers: Vec<i32> = spots.iter().map(|s| s.spot_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(spots.iter().all(|s| s.status == SpotStatus::Available));
    }

    #[tokio::test]
    async fn rejected_edit_changes_nothing() {
        let store = MemoryStore::new();
        let user = crate::store::memory::tests::seed_user(&store, "driver").await;
        let lot = add_lot(&store, fields(2)).await.expect("add");
        store
            .reserve(lot.id, user.id, OffsetDateTime::now_utc())
            .await
            .expect("reserve");

        let mut edit = fields(5);
        edit.price = Decimal::new(99, 0);
        let err = edit_lot(&store, lot.id, edit).await.unwrap_err();
        assert!(matches!(err, ParkingError::ResizeWhileOccupied));

        let after = store.find_lot(lot.id).await.expect("find").expect("lot");
        assert_eq!(after.max_spots, 2);
        assert_eq!(after.price, Decimal::new(10, 0));
        let spots = store.list_spots(Some(lot.id)).await.expect("spots");
        assert_eq!(spots.len(), 2);
        assert_eq!(spots.iter().filter(|s| s.is_occupied()).count(), 1);
    }

    #[tokio::test]
    async fn edit_with_same_capacity_updates_fields_while_occupied() {
        let store = MemoryStore::new();
        let user = crate::store::memory::tests::seed_user(&store, "driver").await;
        let lot = add_lot(&store, fields(2)).await.expect("add");
        store
            .reserve(lot.id, user.id, OffsetDateTime::now_utc())
            .await
            .expect("reserve");

        let mut edit = fields(2);
        edit.location_name = "Renamed".into();
        let lot = edit_lot(&store, lot.id, edit).await.expect("edit");
        assert_eq!(lot.location_name, "Renamed");
    }

    #[tokio::test]
    async fn delete_with_occupied_spot_keeps_everything() {
        let store = MemoryStore::new();
        let user = crate::store::memory::tests::seed_user(&store, "driver").await;
        let lot = add_lot(&store, fields(2)).await.expect("add");
        store
            .reserve(lot.id, user.id, OffsetDateTime::now_utc())
            .await
            .expect("reserve");

        let err = delete_lot(&store, lot.id).await.unwrap_err();
        assert!(matches!(err, ParkingError::DeleteWhileOccupied));
        assert!(store.find_lot(lot.id).await.expect("find").is_some());
        assert_eq!(store.list_spots(Some(lot.id)).await.expect("spots").len(), 2);
        assert_eq!(store.list_reservations(None).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn delete_vacant_lot_removes_spots() {
        let store = MemoryStore::new();
        let lot = add_lot(&store, fields(2)).await.expect("add");
        delete_lot(&store, lot.id).await.expect("delete");
        assert!(store.find_lot(lot.id).await.expect("find").is_none());
        assert!(store.list_spots(Some(lot.id)).await.expect("spots").is_empty());
        assert!(matches!(
            delete_lot(&store, lot.id).await,
            Err(ParkingError::NotFound(_))
        ));
    }
}

use axum::{
    extract::{Path, State},
    routing::post,
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ParkingResult,
    flash::Flash,
    reservations::services,
    state::AppState,
};

const USER_HOME: &str = "/dashboard";

pub fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route("/reserve/:lot_id", post(reserve))
        .route("/vacate/:reservation_id", post(vacate))
}

#[instrument(skip(state))]
pub async fn reserve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(lot_id): Path<Uuid>,
) -> ParkingResult<Flash> {
    match services::reserve(state.store.as_ref(), lot_id, user.id).await {
        Ok(_) => Ok(Flash::to(USER_HOME).message("Spot reserved successfully.")),
        Err(e) if e.is_rule_violation() => Ok(Flash::rejection(USER_HOME, &e)),
        Err(e) => Err(e),
    }
}

#[instrument(skip(state))]
pub async fn vacate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(reservation_id): Path<Uuid>,
) -> ParkingResult<Flash> {
    match services::vacate(state.store.as_ref(), reservation_id, user.id).await {
        Ok(receipt) => Ok(Flash::to(USER_HOME).message(format!(
            "Spot vacated successfully. Total cost: ₹{:.2}",
            receipt.total_cost
        ))),
        Err(e) if e.is_rule_violation() => Ok(Flash::rejection(USER_HOME, &e)),
        Err(e) => Err(e),
    }
}

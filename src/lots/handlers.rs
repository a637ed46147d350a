use axum::{
    extract::{Path, State},
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{dto::FormDescription, extractors::AdminUser},
    error::{ParkingError, ParkingResult},
    flash::Flash,
    lots::{dto::EditLotView, dto::LotForm, services},
    state::AppState,
};

const ADMIN_HOME: &str = "/admin/dashboard";

pub fn admin_lot_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/add_lot", get(add_lot_form).post(add_lot))
        .route("/admin/edit_lot/:id", get(edit_lot_form).post(edit_lot))
        .route("/admin/delete_lot/:id", get(delete_lot))
}

/// Rule violations become a flash on the admin dashboard; the rest propagate.
fn flash_or_err(result: ParkingResult<()>, success: &str) -> ParkingResult<Flash> {
    match result {
        Ok(()) => Ok(Flash::to(ADMIN_HOME).message(success)),
        Err(e) if e.is_rule_violation() => Ok(Flash::rejection(ADMIN_HOME, &e)),
        Err(e) => Err(e),
    }
}

pub async fn add_lot_form(_admin: AdminUser) -> Json<FormDescription> {
    Json(FormDescription {
        action: "/admin/add_lot".into(),
        method: "POST",
        fields: &["name", "price", "address", "pin", "max_spots"],
    })
}

#[instrument(skip(state, form))]
pub async fn add_lot(
    State(state): State<AppState>,
    _admin: AdminUser,
    Form(form): Form<LotForm>,
) -> ParkingResult<Flash> {
    let values = form.validate()?;
    services::add_lot(state.store.as_ref(), values).await?;
    Ok(Flash::to(ADMIN_HOME).message("Parking lot and spots added successfully."))
}

#[instrument(skip(state))]
pub async fn edit_lot_form(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ParkingResult<Json<EditLotView>> {
    let lot = state
        .store
        .find_lot(id)
        .await?
        .ok_or(ParkingError::NotFound("parking lot"))?;
    let spots = state.store.list_spots(Some(id)).await?;
    Ok(Json(EditLotView {
        action: format!("/admin/edit_lot/{id}"),
        spot_count: spots.len(),
        occupied_spots: spots.iter().filter(|s| s.is_occupied()).count(),
        lot,
    }))
}

#[instrument(skip(state, form))]
pub async fn edit_lot(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Form(form): Form<LotForm>,
) -> ParkingResult<Flash> {
    let values = form.validate()?;
    let result = services::edit_lot(state.store.as_ref(), id, values).await;
    flash_or_err(result.map(|_| ()), "Parking lot updated successfully.")
}

#[instrument(skip(state))]
pub async fn delete_lot(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> ParkingResult<Flash> {
    let result = services::delete_lot(state.store.as_ref(), id).await;
    flash_or_err(result, "Parking lot deleted successfully.")
}

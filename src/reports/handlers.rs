use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::PublicUser,
        extractors::{AdminUser, AuthUser},
    },
    error::ParkingResult,
    reports::{
        dto::{AdminDashboard, CostReport, Occupancy, UserDashboard, UserSummary},
        services,
    },
    state::AppState,
};

pub fn user_report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(user_dashboard))
        .route("/history", get(history))
        .route("/summary", get(summary))
}

pub fn admin_report_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/admin/users", get(admin_users))
        .route("/admin/summary", get(admin_summary))
        .route("/admin/view_reservations", get(view_reservations))
}

#[instrument(skip(state))]
pub async fn user_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> ParkingResult<Json<UserDashboard>> {
    Ok(Json(services::user_dashboard(state.store.as_ref(), user.id).await?))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
) -> ParkingResult<Json<CostReport>> {
    Ok(Json(services::user_history(state.store.as_ref(), user.id).await?))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> ParkingResult<Json<UserSummary>> {
    Ok(Json(services::user_summary(state.store.as_ref(), user.id).await?))
}

#[instrument(skip(state))]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ParkingResult<Json<AdminDashboard>> {
    Ok(Json(services::admin_dashboard(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn admin_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ParkingResult<Json<Vec<PublicUser>>> {
    Ok(Json(services::admin_users(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn admin_summary(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ParkingResult<Json<Occupancy>> {
    Ok(Json(services::admin_summary(state.store.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn view_reservations(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ParkingResult<Json<CostReport>> {
    Ok(Json(services::all_reservations(state.store.as_ref()).await?))
}

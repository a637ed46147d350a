use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{FormDescription, LoginForm, LoginResponse, PublicUser, RegisterForm},
        extractors::AuthUser,
        repo_types::Role,
        services::{self, expired_session_cookie, JwtKeys},
    },
    error::ParkingError,
    flash::Flash,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "parkspot",
        "links": {
            "register": "/register",
            "login": "/login",
            "dashboard": "/dashboard",
            "admin": "/admin/dashboard",
        }
    }))
}

pub async fn register_form() -> Json<FormDescription> {
    Json(FormDescription {
        action: "/register".into(),
        method: "POST",
        fields: &[
            "username",
            "email",
            "password",
            "pincode",
            "phone_number",
            "vehicle_number",
        ],
    })
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Flash, ParkingError> {
    match services::register(state.store.as_ref(), form).await {
        Ok(_) => Ok(Flash::to("/login").message("Registration successful. Please log in.")),
        Err(e) if e.is_rule_violation() => Ok(Flash::rejection("/register", &e)),
        Err(ParkingError::Validation(msg)) => Ok(Flash::to("/register").message(msg)),
        Err(e) => Err(e),
    }
}

pub async fn login_form() -> Json<FormDescription> {
    Json(FormDescription {
        action: "/login".into(),
        method: "POST",
        fields: &["username", "password"],
    })
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ParkingError> {
    let user = match services::authenticate(state.store.as_ref(), &form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) if e.is_rule_violation() => {
            return Ok(Flash::rejection("/login", &e).into_response())
        }
        Err(e) => return Err(e),
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id, user.role)?;
    let redirect = match user.role {
        Role::Admin => "/admin/dashboard",
        Role::User => "/dashboard",
    };

    info!(user_id = %user.id, role = ?user.role, "user logged in");
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, redirect.to_string()),
            (header::SET_COOKIE, keys.session_cookie(&access_token)),
        ],
        Json(LoginResponse {
            access_token,
            redirect,
            user: PublicUser::from(user),
        }),
    )
        .into_response())
}

#[instrument]
pub async fn logout(user: AuthUser) -> Flash {
    info!(user_id = %user.id, "user logged out");
    Flash::to("/")
        .message("You have been logged out.")
        .with_cookie(expired_session_cookie())
}

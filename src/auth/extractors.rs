use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

use super::dto::JwtKeys;
use super::repo_types::Role;
use super::services::{expired_session_cookie, token_from_headers};
use crate::flash::Flash;
use crate::state::AppState;

/// Denying this page also ends the session.
const ADMIN_DASHBOARD: &str = "/admin/dashboard";

fn session_expired() -> Response {
    Flash::to("/login")
        .message("Your session has expired. Please log in again.")
        .with_cookie(expired_session_cookie())
        .into_response()
}

/// Any signed-in account that still exists. Unauthenticated requests are
/// sent to `/login`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let keys = JwtKeys::from_ref(&state);
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            Flash::to("/login")
                .message("Please log in to access this page.")
                .into_response()
        })?;

        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            session_expired()
        })?;

        let user = state
            .store
            .find_user(claims.sub)
            .await
            .map_err(IntoResponse::into_response)?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown user");
                session_expired()
            })?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// Signed-in account with the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            let path = parts.uri.path();
            warn!(user_id = %user.id, %path, "admin route denied");
            let denied = if path == ADMIN_DASHBOARD {
                Flash::to("/login")
                    .message("Access denied. Admins only.")
                    .with_cookie(expired_session_cookie())
            } else {
                Flash::to("/login").message("Access denied.")
            };
            return Err(denied.into_response());
        }
        Ok(AdminUser(user))
    }
}

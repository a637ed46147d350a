use axum::extract::FromRef;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub(crate) use crate::auth::claims::Claims;
pub(crate) use crate::auth::dto::JwtKeys;
use crate::auth::dto::RegisterForm;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{NewUser, Role, User};
use crate::config::{AdminSeed, JwtConfig};
use crate::error::{ParkingError, ParkingResult};
use crate::state::AppState;
use crate::store::ParkingStore;

pub const TOKEN_COOKIE: &str = "access_token";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,80}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate a registration form and store the new account.
///
/// Self-service registration always creates a `user`; asking for `admin` is
/// refused.
#[instrument(skip(store, form), fields(username = %form.username))]
pub async fn register(store: &dyn ParkingStore, form: RegisterForm) -> ParkingResult<User> {
    let username = form.username.trim().to_string();
    let email = form.email.trim().to_lowercase();

    if form.role.as_deref().map(str::trim) == Some("admin") {
        return Err(ParkingError::AdminRegistration);
    }
    if !is_valid_username(&username) {
        return Err(ParkingError::Validation(
            "Username must be 3-80 letters, digits, '.', '_' or '-'".into(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(ParkingError::Validation("Invalid email".into()));
    }
    if form.password.is_empty() {
        return Err(ParkingError::Validation("Password is required".into()));
    }
    if store.find_user_by_username(&username).await?.is_some() {
        return Err(ParkingError::UsernameTaken);
    }

    let user = store
        .create_user(NewUser {
            username,
            email,
            password_hash: hash_password(&form.password)?,
            role: Role::User,
            pin_code: non_empty(form.pincode),
            phone_number: non_empty(form.phone_number),
            vehicle_number: non_empty(form.vehicle_number),
        })
        .await?;
    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Check credentials; unknown users and wrong passwords look the same.
pub async fn authenticate(
    store: &dyn ParkingStore,
    username: &str,
    password: &str,
) -> ParkingResult<User> {
    let Some(user) = store.find_user_by_username(username.trim()).await? else {
        warn!(username, "login unknown username");
        return Err(ParkingError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ParkingError::InvalidCredentials);
    }
    Ok(user)
}

/// Create the configured admin account unless it already exists.
pub async fn ensure_admin(store: &dyn ParkingStore, seed: &AdminSeed) -> ParkingResult<()> {
    if store.find_user_by_username(&seed.username).await?.is_some() {
        debug!(username = %seed.username, "admin account present");
        return Ok(());
    }
    let admin = store
        .create_user(NewUser {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password_hash: hash_password(&seed.password)?,
            role: Role::Admin,
            pin_code: None,
            phone_number: None,
            vehicle_number: None,
        })
        .await?;
    info!(user_id = %admin.id, username = %admin.username, "admin user created");
    Ok(())
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn sign(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            role,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, role = ?role, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, role = ?data.claims.role, "jwt verified");
        Ok(data.claims)
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            self.ttl.as_secs()
        )
    }
}

pub fn expired_session_cookie() -> String {
    format!("{TOKEN_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

/// Token from `Authorization: Bearer ...`, falling back to the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")));
    if bearer.is_some() {
        return bearer;
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

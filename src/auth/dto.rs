use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use super::repo_types::{Role, User};

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// Form body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
}

/// Form body for login.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Body of a successful login; the same token is also set as a cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub redirect: &'static str,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub pin_code: Option<String>,
    pub phone_number: Option<String>,
    pub vehicle_number: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            pin_code: u.pin_code,
            phone_number: u.phone_number,
            vehicle_number: u.vehicle_number,
        }
    }
}

/// Describes an HTML-less form: where it posts and which fields it takes.
#[derive(Debug, Serialize)]
pub struct FormDescription {
    pub action: String,
    pub method: &'static str,
    pub fields: &'static [&'static str],
}

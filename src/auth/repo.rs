use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Role, User, UserRow};
use crate::error::{ParkingError, ParkingResult};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, pin_code, phone_number, \
                            vehicle_number, created_at";

/// Find a user by username.
pub async fn find_by_username(db: &PgPool, username: &str) -> ParkingResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(db)
    .await?;
    row.map(User::try_from).transpose()
}

/// Find a user by id.
pub async fn find_by_id(db: &PgPool, id: Uuid) -> ParkingResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    row.map(User::try_from).transpose()
}

pub async fn list_by_role(db: &PgPool, role: Role) -> ParkingResult<Vec<User>> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY username"
    ))
    .bind(role.as_str())
    .fetch_all(db)
    .await?;
    rows.into_iter().map(User::try_from).collect()
}

/// Create a new user with an already hashed password.
pub async fn create(db: &PgPool, new: NewUser) -> ParkingResult<User> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, pin_code, phone_number, vehicle_number)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.role.as_str())
    .bind(&new.pin_code)
    .bind(&new.phone_number)
    .bind(&new.vehicle_number)
    .fetch_one(db)
    .await
    .map_err(map_unique_violation)?;
    User::try_from(row)
}

fn map_unique_violation(err: sqlx::Error) -> ParkingError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => ParkingError::EmailTaken,
                _ => ParkingError::UsernameTaken,
            };
        }
    }
    ParkingError::Database(err)
}

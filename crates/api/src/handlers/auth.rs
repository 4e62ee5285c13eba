//! Handlers for the `/auth` resource (register, login, profile, account).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use roadsign_core::error::CoreError;
use roadsign_core::types::DbId;
use roadsign_db::models::stats::ProfileStats;
use roadsign_db::models::user::{CreateUser, User, UserResponse};
use roadsign_db::repositories::{StatsRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "Password must be at least 8 characters long"))]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account and return an access token for it.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    if UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Username '{}' is already taken",
            input.username
        ))));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username + password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        ))
    };

    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid());
    }

    Ok(Json(auth_response(&state, &user)?))
}

/// GET /api/v1/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<UserResponse>> {
    let user = find_user(&state, auth.user_id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/v1/auth/profile/stats
pub async fn profile_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ProfileStats>> {
    let user = find_user(&state, auth.user_id).await?;
    let stats = StatsRepo::profile_stats(&state.pool, &user).await?;
    Ok(Json(stats))
}

/// DELETE /api/v1/auth/account
///
/// Delete the caller's account together with its detection history.
pub async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<MessageResponse>> {
    if !UserRepo::delete(&state.pool, auth.user_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: auth.user_id,
        }));
    }
    tracing::info!(user_id = auth.user_id, "Account deleted");

    Ok(Json(MessageResponse {
        message: "Account deleted successfully",
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, user_id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: user_id,
        }))
}

fn auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, &user.username, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        access_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserResponse::from(user),
    })
}

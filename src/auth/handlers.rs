use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        extractors::AuthUser,
        jwt::{JwtKeys, TokenError},
        password::{hash_password, verify_decoy, verify_password},
    },
    common::ApiJson,
    error::ApiError,
    state::AppState,
    users::{
        dto::{PublicUser, UserResponse},
        repo_types::NewUser,
        validation::{non_blank, normalize_email, parse_email, parse_role},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

/// Keys for issuing a token, or the "secret not set" server error.
fn signing_keys(state: &AppState) -> Result<JwtKeys, ApiError> {
    let keys = JwtKeys::from_ref(state);
    if !keys.is_configured() {
        error!("JWT secret not set; refusing to issue tokens");
        return Err(ApiError::internal(
            "JWT secret not set",
            TokenError::MissingSecret,
        ));
    }
    Ok(keys)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
        non_blank(payload.name),
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
        non_blank(payload.role),
    ) else {
        warn!("register with missing fields");
        return Err(ApiError::validation(
            "All fields (name, email, password, role) are required",
        ));
    };

    let email = parse_email(&email)?;
    let role = parse_role(&role)?;
    let keys = signing_keys(&state)?;

    let existing = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Server error", e))?;
    if existing.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash =
        hash_password(&password).map_err(|e| ApiError::internal("Server error", e))?;

    // a concurrent registration can still hit the unique constraint here
    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
            role,
        })
        .await?;

    let token = keys
        .sign(user.id, user.role)
        .map_err(|e| ApiError::internal("Server error", e))?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully",
            user: PublicUser::from(user),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        warn!("login with missing fields");
        return Err(ApiError::validation("Email and password are required"));
    };
    let email = normalize_email(&email);

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Server error", e))?;

    let Some(user) = user else {
        verify_decoy(&password);
        warn!(email = %email, "login unknown email");
        return Err(ApiError::validation(INVALID_CREDENTIALS));
    };

    let ok = verify_password(&password, &user.password_hash)
        .map_err(|e| ApiError::internal("Server error", e))?;
    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::validation(INVALID_CREDENTIALS));
    }

    let keys = signing_keys(&state)?;
    let token = keys
        .sign(user.id, user.role)
        .map_err(|e| ApiError::internal("Server error", e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        user: PublicUser::from(user),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await
        .map_err(|e| ApiError::internal("Server error", e))?
        .ok_or_else(|| {
            warn!(user_id = %auth.id, "token subject no longer exists");
            ApiError::not_found("User not found")
        })?;

    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

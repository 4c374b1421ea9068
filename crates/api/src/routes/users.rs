//! Owner routes: registration, login, lookup.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post, put},
};
use coffer_core::owner::{CredentialCheck, NewOwner, OwnerRecord, PublicProfile};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError, error::ApiResult};

/// Creates the owner routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/{user_id}", get(get_user))
        .route("/login", put(login))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an owner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// First name.
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Login e-mail.
    pub email_address: String,
    /// Admin flag.
    #[serde(default)]
    pub is_admin: bool,
    /// Plaintext password.
    pub password: String,
}

/// Request body for logging in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login e-mail.
    pub email_address: String,
    /// Plaintext password.
    pub password: String,
}

/// Response for listing owners.
#[derive(Debug, Serialize)]
pub struct MembersResponse {
    /// Every owner, in store order.
    pub members: Vec<PublicProfile>,
}

fn invalid_body(rejection: &JsonRejection, action: &str) -> ApiError {
    ApiError::bad_request(format!("Invalid request body: {rejection}"), action)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/users`
/// Register an owner; the password is stored hashed.
async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PublicProfile>)> {
    let Json(payload) = payload.map_err(|e| invalid_body(&e, "Check user create request body"))?;

    if payload.email_address.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(
            "emailAddress and password are required",
            "Check user create request body",
        ));
    }

    let owner = state
        .records
        .register(NewOwner {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email_address: payload.email_address,
            is_admin: payload.is_admin,
            password: payload.password,
        })
        .await?;

    info!(user_id = %owner.id, is_admin = owner.profile.is_admin, "User created");
    Ok((StatusCode::CREATED, Json(owner.public_view())))
}

/// PUT `/login`
/// Check credentials and report the admin flag.
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<CredentialCheck>> {
    let Json(payload) = payload.map_err(|e| {
        invalid_body(
            &e,
            "Check user credentials. Should have emailAddress and password",
        )
    })?;

    let check = state
        .records
        .verify_credentials(&payload.email_address, &payload.password)
        .await?;
    Ok(Json(check))
}

/// GET `/users`
/// List every owner.
async fn list_users(State(state): State<AppState>) -> ApiResult<Json<MembersResponse>> {
    let members = state
        .records
        .list(None)
        .await?
        .iter()
        .map(OwnerRecord::public_view)
        .collect();
    Ok(Json(MembersResponse { members }))
}

/// GET `/users/{user_id}`
/// Fetch one owner.
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PublicProfile>> {
    let owner = state.records.get(&user_id).await?;
    Ok(Json(owner.public_view()))
}

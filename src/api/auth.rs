//! Admin authentication endpoints

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::admin::{AdminUser, LoginRequest},
};

use super::{bookings::MessageResponse, AuthenticatedAdmin, DataResponse, ADMIN_COOKIE};

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminUser,
}

/// Log in; the token is returned and also set as an http-only cookie
#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, wrapped in {success, data}", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<DataResponse<LoginResponse>>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let session = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;

    let cookie = Cookie::build((ADMIN_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict);

    Ok((
        jar.add(cookie),
        Json(DataResponse::new(LoginResponse {
            token: session.token,
            token_type: "Bearer".to_string(),
            expires_at: session.expires_at,
            admin: session.admin,
        })),
    ))
}

/// Close the current session
#[utoipa::path(
    post,
    path = "/admin/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out, wrapped in {success, data}", body = MessageResponse)
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(claims): AuthenticatedAdmin,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<DataResponse<MessageResponse>>)> {
    state.services.auth.logout(claims.sid).await?;
    Ok((
        jar.remove(Cookie::build(ADMIN_COOKIE).path("/")),
        Json(DataResponse::new(MessageResponse {
            message: "Logged out".to_string(),
        })),
    ))
}

/// Current admin for a valid session
#[utoipa::path(
    get,
    path = "/admin/validate",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session is valid, wrapped in {success, data}", body = AdminUser),
        (status = 401, description = "Missing or expired session", body = crate::error::ErrorResponse)
    )
)]
pub async fn validate(
    State(state): State<crate::AppState>,
    AuthenticatedAdmin(claims): AuthenticatedAdmin,
) -> AppResult<Json<DataResponse<AdminUser>>> {
    let admin = state.services.auth.current_admin(&claims).await?;
    Ok(Json(DataResponse::new(admin)))
}

// src/handlers/auth.rs

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{
    common::{error::AppError, extract::ValidatedJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{AuthResponse, ChangePasswordPayload, Claims, LoginPayload},
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token emitido", body = AuthResponse),
        (status = 401, description = "Credenciales inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = app_state.auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/cambiar-password",
    tag = "Auth",
    request_body = ChangePasswordPayload,
    responses(
        (status = 200, description = "Contraseña actualizada"),
        (status = 401, description = "Credenciales inválidas")
    )
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ChangePasswordPayload>,
) -> Result<Json<Value>, AppError> {
    app_state.auth_service
        .change_password(&payload.username, &payload.password_actual, &payload.password_nueva)
        .await?;

    Ok(Json(json!({ "mensaje": "Contraseña actualizada correctamente." })))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Datos del token actual", body = Claims),
        (status = 401, description = "Token ausente o inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(claims): AuthenticatedUser) -> Json<Claims> {
    Json(claims)
}

// src/handlers/rbac.rs

use axum::{extract::State, Json};

use crate::{common::error::AppError, config::AppState, models::rbac::Permiso};

// GET /api/permisos (el frontend arma la pantalla de roles con esto)
#[utoipa::path(
    get,
    path = "/api/permisos",
    tag = "RBAC",
    responses(
        (status = 200, description = "Catálogo de permisos", body = Vec<Permiso>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Permiso>>, AppError> {
    let permissions = app_state.rbac_service.list_permissions().await?;
    Ok(Json(permissions))
}

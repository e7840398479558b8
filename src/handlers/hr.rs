// src/handlers/hr.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    common::{error::AppError, extract::ValidatedJson},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermRrhhReabrir, RequirePermission},
    },
    models::hr::{
        CreateMovimientoRrhhPayload, FinalizarMesPayload, FinalizarMesResponse, MovimientoRrhh,
        MovimientosMesResponse, PeriodoPayload, PeriodoQuery,
    },
};

#[utoipa::path(
    post,
    path = "/api/rrhh/movimientos",
    tag = "RRHH",
    request_body = CreateMovimientoRrhhPayload,
    responses(
        (status = 201, description = "Movimiento creado", body = MovimientoRrhh),
        (status = 400, description = "Datos inválidos o mes finalizado"),
        (status = 404, description = "Persona inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_movement(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CreateMovimientoRrhhPayload>,
) -> Result<impl IntoResponse, AppError> {
    let movimiento = app_state.hr_service.create_movement(payload, user.id).await?;

    Ok((StatusCode::CREATED, Json(movimiento)))
}

#[utoipa::path(
    delete,
    path = "/api/rrhh/movimientos/{id}",
    tag = "RRHH",
    params(("id" = i32, Path, description = "ID del movimiento")),
    responses(
        (status = 204, description = "Movimiento eliminado"),
        (status = 400, description = "El mes del movimiento está finalizado"),
        (status = 404, description = "Movimiento inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_movement(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.hr_service.delete_movement(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/rrhh/finalizar-mes",
    tag = "RRHH",
    request_body = FinalizarMesPayload,
    responses(
        (status = 200, description = "Mes finalizado; totales como texto decimal", body = FinalizarMesResponse),
        (status = 400, description = "Datos inválidos, mes ya finalizado o cotización faltante"),
        (status = 404, description = "Persona inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_month(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<FinalizarMesPayload>,
) -> Result<Json<FinalizarMesResponse>, AppError> {
    let response = app_state.hr_service.finalize_month(payload, user.id).await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/rrhh/reabrir-mes",
    tag = "RRHH",
    request_body = PeriodoPayload,
    responses(
        (status = 200, description = "Mes reabierto"),
        (status = 400, description = "El mes no estaba finalizado"),
        (status = 403, description = "Falta el permiso rrhh:reabrir")
    ),
    security(("api_jwt" = []))
)]
pub async fn reopen_month(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermRrhhReabrir>,
    ValidatedJson(payload): ValidatedJson<PeriodoPayload>,
) -> Result<Json<Value>, AppError> {
    let resumen_id = app_state.hr_service.reopen_month(payload, user.id).await?;

    Ok(Json(json!({ "resumenId": resumen_id, "finalizado": false })))
}

#[utoipa::path(
    get,
    path = "/api/rrhh/movimientos/{persona_id}",
    tag = "RRHH",
    params(
        ("persona_id" = i32, Path, description = "ID de la persona"),
        PeriodoQuery
    ),
    responses(
        (status = 200, description = "Líneas del mes (congeladas si está finalizado)", body = MovimientosMesResponse),
        (status = 404, description = "Persona inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_month_movements(
    State(app_state): State<AppState>,
    Path(persona_id): Path<i32>,
    Query(query): Query<PeriodoQuery>,
) -> Result<Json<MovimientosMesResponse>, AppError> {
    query.validate().map_err(AppError::ValidationError)?;

    let response = app_state.hr_service
        .get_month(persona_id, query.mes, query.anio)
        .await?;

    Ok(Json(response))
}

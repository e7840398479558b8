// src/handlers/service_payments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, extract::ValidatedJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::service_payments::{CreatePagoServicioPayload, PagoServicio, PagosServiciosQuery},
};

#[utoipa::path(
    post,
    path = "/api/pagos-servicios",
    tag = "Pagos de servicios",
    request_body = CreatePagoServicioPayload,
    responses(
        (status = 201, description = "Pago registrado junto con su egreso", body = PagoServicio),
        (status = 404, description = "Caja inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CreatePagoServicioPayload>,
) -> Result<impl IntoResponse, AppError> {
    let pago = app_state.service_payment_service.create(payload, user.id).await?;

    Ok((StatusCode::CREATED, Json(pago)))
}

#[utoipa::path(
    get,
    path = "/api/pagos-servicios",
    tag = "Pagos de servicios",
    params(PagosServiciosQuery),
    responses(
        (status = 200, description = "Pagos registrados", body = Vec<PagoServicio>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    Query(query): Query<PagosServiciosQuery>,
) -> Result<Json<Vec<PagoServicio>>, AppError> {
    let pagos = app_state.service_payment_service.list(query.caja_id).await?;
    Ok(Json(pagos))
}

#[utoipa::path(
    get,
    path = "/api/pagos-servicios/{id}",
    tag = "Pagos de servicios",
    params(("id" = Uuid, Path, description = "ID del pago")),
    responses(
        (status = 200, description = "Pago", body = PagoServicio),
        (status = 404, description = "Pago inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_payment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PagoServicio>, AppError> {
    let pago = app_state.service_payment_service.get(id).await?;
    Ok(Json(pago))
}

#[utoipa::path(
    put,
    path = "/api/pagos-servicios/{id}",
    tag = "Pagos de servicios",
    request_body = CreatePagoServicioPayload,
    params(("id" = Uuid, Path, description = "ID del pago")),
    responses(
        (status = 200, description = "Pago y egreso actualizados", body = PagoServicio),
        (status = 400, description = "Datos inválidos"),
        (status = 404, description = "Pago o caja inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreatePagoServicioPayload>,
) -> Result<Json<PagoServicio>, AppError> {
    let pago = app_state.service_payment_service.update(id, payload, user.id).await?;
    Ok(Json(pago))
}

#[utoipa::path(
    delete,
    path = "/api/pagos-servicios/{id}",
    tag = "Pagos de servicios",
    params(("id" = Uuid, Path, description = "ID del pago")),
    responses(
        (status = 204, description = "Pago y egreso eliminados"),
        (status = 404, description = "Pago inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_payment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.service_payment_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

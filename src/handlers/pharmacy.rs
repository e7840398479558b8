// src/handlers/pharmacy.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::pharmacy::{MovimientoFarmacia, MovimientosFarmaciaQuery},
};

#[utoipa::path(
    get,
    path = "/api/movimientos-farmacia",
    tag = "Farmacia",
    params(MovimientosFarmaciaQuery),
    responses(
        (status = 200, description = "Libro de movimientos, más recientes primero", body = Vec<MovimientoFarmacia>),
        (status = 400, description = "Rango de fechas inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Query(query): Query<MovimientosFarmaciaQuery>,
) -> Result<Json<Vec<MovimientoFarmacia>>, AppError> {
    if let (Some(desde), Some(hasta)) = (query.desde, query.hasta) {
        if desde > hasta {
            return Err(AppError::BadRequest("'desde' no puede ser posterior a 'hasta'.".into()));
        }
    }

    let movimientos = app_state.pharmacy_repo.list(query.desde, query.hasta).await?;
    Ok(Json(movimientos))
}

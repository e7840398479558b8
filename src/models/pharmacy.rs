// src/models/pharmacy.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::currency::Moneda;

// De dónde salió el movimiento del libro de farmacia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "origen_movimiento_farmacia", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrigenMovimiento {
    Manual,
    OperacionBancaria,
    PagoServicio,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimientoFarmacia {
    pub id: Uuid,
    pub fecha: DateTime<Utc>,
    #[schema(example = "POS Bancard Caja 1 - Cobro con tarjeta")]
    pub concepto: String,
    pub moneda: Moneda,
    // Positivo = ingreso, negativo = egreso
    #[schema(value_type = f64, example = -150000)]
    pub monto: Decimal,
    pub origen: OrigenMovimiento,
    pub operacion_bancaria_id: Option<Uuid>,
    pub pago_servicio_id: Option<Uuid>,
    pub usuario_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para insertar o actualizar un movimiento vinculado.
#[derive(Debug, Clone, PartialEq)]
pub struct NuevoMovimientoFarmacia {
    pub concepto: String,
    pub moneda: Moneda,
    pub monto: Decimal,
    pub origen: OrigenMovimiento,
    pub operacion_bancaria_id: Option<Uuid>,
    pub pago_servicio_id: Option<Uuid>,
    pub usuario_id: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovimientosFarmaciaQuery {
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
}

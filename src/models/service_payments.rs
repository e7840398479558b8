// src/models/service_payments.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::positive_amount;
use crate::models::currency::Moneda;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagoServicio {
    pub id: Uuid,
    pub caja_id: Uuid,
    #[schema(example = "ANDE")]
    pub tipo_servicio: String,
    pub moneda: Moneda,
    #[schema(value_type = f64, example = 250000)]
    pub monto: Decimal,
    pub observacion: Option<String>,
    pub usuario_id: Option<i32>,
    pub fecha: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePagoServicioPayload {
    pub caja_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "El tipo de servicio debe tener entre 1 y 100 caracteres."))]
    pub tipo_servicio: String,

    #[serde(default = "default_moneda")]
    pub moneda: Moneda,

    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = String, example = "250000")]
    pub monto: Decimal,

    #[validate(length(max = 500, message = "La observación admite hasta 500 caracteres."))]
    pub observacion: Option<String>,
}

fn default_moneda() -> Moneda {
    Moneda::GS
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PagosServiciosQuery {
    pub caja_id: Option<Uuid>,
}

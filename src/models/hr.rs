// src/models/hr.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::validation::{non_zero_amount, valid_rates};
use crate::models::currency::{Cotizacion, Moneda};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_movimiento_rrhh")]
pub enum TipoMovimientoRrhh {
    Bonificacion,
    Descuento,
    Multa,
    Compras,
    Adelanto,
    Jornales,
    IPS,
}

impl TipoMovimientoRrhh {
    pub fn as_str(self) -> &'static str {
        match self {
            TipoMovimientoRrhh::Bonificacion => "Bonificacion",
            TipoMovimientoRrhh::Descuento => "Descuento",
            TipoMovimientoRrhh::Multa => "Multa",
            TipoMovimientoRrhh::Compras => "Compras",
            TipoMovimientoRrhh::Adelanto => "Adelanto",
            TipoMovimientoRrhh::Jornales => "Jornales",
            TipoMovimientoRrhh::IPS => "IPS",
        }
    }
}

// Fuente de cada línea del resumen mensual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "origen_linea_rrhh", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrigenLinea {
    Movimiento,
    Vale,
    Sueldo,
    Ips,
}

// --- Fuentes vivas ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimientoRrhh {
    pub id: i32,
    pub persona_id: i32,
    pub mes: i16,
    pub anio: i16,
    pub tipo: TipoMovimientoRrhh,
    pub moneda: Moneda,
    #[schema(value_type = f64, example = -50000)]
    pub monto: Decimal,
    pub observacion: Option<String>,
    #[schema(value_type = String, format = Date, example = "2025-05-12")]
    pub fecha: NaiveDate,
    pub usuario_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Vale {
    pub id: i32,
    pub persona_id: i32,
    pub fecha_vencimiento: NaiveDate,
    pub motivo: Option<String>,
    pub moneda: Moneda,
    pub monto: Decimal,
    pub estado: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Sueldo {
    pub id: i32,
    pub persona_id: i32,
    pub mes: i16,
    pub anio: i16,
    pub moneda: Moneda,
    pub monto: Decimal,
}

/// Todo lo que aporta a un mes antes de convertirlo en líneas.
#[derive(Debug, Clone, Default)]
pub struct MonthSources {
    pub movimientos: Vec<MovimientoRrhh>,
    pub vales: Vec<Vale>,
    pub sueldo: Option<Sueldo>,
    // Sueldo mínimo vigente, solo si la persona está inscripta en IPS
    pub sueldo_minimo_ips: Option<Decimal>,
}

// --- Línea del resumen (viva o congelada) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineaMes {
    pub origen: OrigenLinea,
    pub origen_id: Option<i32>,
    #[schema(example = "Descuento")]
    pub tipo: String,
    #[schema(value_type = String, format = Date, example = "2025-05-20")]
    pub fecha: NaiveDate,
    pub moneda: Moneda,
    #[schema(value_type = f64, example = 100)]
    pub monto: Decimal,
    #[schema(value_type = Option<f64>, example = 730000)]
    pub monto_gs: Option<Decimal>,
    pub observacion: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ResumenMes {
    pub id: i32,
    pub persona_id: i32,
    pub mes: i16,
    pub anio: i16,
    pub total_gs: Decimal,
    pub total_usd: Decimal,
    pub total_brl: Decimal,
    pub total_final_gs: Decimal,
    pub cotizaciones_usadas: sqlx::types::Json<Vec<Cotizacion>>,
    pub finalizado: bool,
    pub finalizado_por: Option<i32>,
    pub finalizado_en: Option<DateTime<Utc>>,
    pub reabierto_por: Option<i32>,
    pub reabierto_en: Option<DateTime<Utc>>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovimientoRrhhPayload {
    #[validate(range(min = 1, message = "Persona inválida."))]
    pub persona_id: i32,

    #[validate(range(min = 1, max = 12, message = "El mes debe estar entre 1 y 12."))]
    pub mes: i16,

    #[validate(range(min = 2000, max = 2100, message = "Año fuera de rango."))]
    pub anio: i16,

    pub tipo: TipoMovimientoRrhh,

    #[serde(default = "default_moneda")]
    pub moneda: Moneda,

    #[validate(custom(function = "non_zero_amount"))]
    #[schema(value_type = String, example = "-50000")]
    pub monto: Decimal,

    #[validate(length(max = 500, message = "La observación admite hasta 500 caracteres."))]
    pub observacion: Option<String>,

    #[schema(value_type = Option<String>, format = Date)]
    pub fecha: Option<NaiveDate>,
}

fn default_moneda() -> Moneda {
    Moneda::GS
}

/// Saldos netos por moneda que calcula el frontend al cerrar el mes.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct SaldosMoneda {
    #[serde(default, rename = "GS", alias = "PYG")]
    #[schema(value_type = String, example = "-50000")]
    pub gs: Decimal,
    #[serde(default, rename = "USD")]
    #[schema(value_type = String, example = "100")]
    pub usd: Decimal,
    #[serde(default, rename = "BRL")]
    #[schema(value_type = String, example = "0")]
    pub brl: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizarMesPayload {
    #[validate(range(min = 1, message = "Persona inválida."))]
    pub persona_id: i32,

    #[validate(range(min = 1, max = 12, message = "El mes debe estar entre 1 y 12."))]
    pub mes: i16,

    #[validate(range(min = 2000, max = 2100, message = "Año fuera de rango."))]
    pub anio: i16,

    #[serde(default)]
    pub totales: SaldosMoneda,

    #[serde(default)]
    #[validate(custom(function = "valid_rates"))]
    pub cotizaciones: Vec<Cotizacion>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodoPayload {
    #[validate(range(min = 1, message = "Persona inválida."))]
    pub persona_id: i32,

    #[validate(range(min = 1, max = 12, message = "El mes debe estar entre 1 y 12."))]
    pub mes: i16,

    #[validate(range(min = 2000, max = 2100, message = "Año fuera de rango."))]
    pub anio: i16,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PeriodoQuery {
    #[validate(range(min = 1, max = 12, message = "El mes debe estar entre 1 y 12."))]
    pub mes: i16,

    #[validate(range(min = 2000, max = 2100, message = "Año fuera de rango."))]
    pub anio: i16,
}

// --- Respuestas ---

/// Totales del cierre. Van como texto para no perder precisión en el transporte.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TotalesMes {
    #[serde(rename = "totalGS", with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "-50000")]
    pub total_gs: Decimal,
    #[serde(rename = "totalUSD", with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "100")]
    pub total_usd: Decimal,
    #[serde(rename = "totalBRL", with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "0")]
    pub total_brl: Decimal,
    #[serde(rename = "totalFinalGS", with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "680000")]
    pub total_final_gs: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizarMesResponse {
    pub resumen_id: i32,
    #[serde(flatten)]
    pub totales: TotalesMes,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovimientosMesResponse {
    pub persona_id: i32,
    pub mes: i16,
    pub anio: i16,
    pub finalizado: bool,
    pub resumen_id: Option<i32>,
    // Solo presentes cuando el mes está finalizado
    pub totales: Option<TotalesMes>,
    pub cotizaciones: Vec<Cotizacion>,
    pub movimientos: Vec<LineaMes>,
}

// src/models/bank_operations.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::common::validation::{self, positive_amount};
use crate::models::currency::Moneda;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_operacion_bancaria", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoOperacion {
    Pos,
    Transferencia,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperacionBancaria {
    pub id: Uuid,
    pub caja_id: Uuid,
    pub tipo: TipoOperacion,
    #[schema(value_type = f64, example = 150000)]
    pub monto: Decimal,
    #[schema(value_type = Option<f64>)]
    pub monto_a_cobrar: Option<Decimal>,
    #[schema(example = "Giros Tigo")]
    pub tipo_servicio: String,
    pub moneda_pos: Option<Moneda>,
    #[schema(value_type = Option<f64>)]
    pub monto_original: Option<Decimal>,
    pub pos_codigo_barra: Option<String>,
    pub cuenta_bancaria_id: Option<i32>,
    #[schema(example = "comprobantes/6f1c0e0e-4e9b-4d43-9a57-0c5b4d3f9a10.jpg")]
    pub comprobante: Option<String>,
    pub observacion: Option<String>,
    pub verificado: bool,
    pub verificado_por_usuario_id: Option<i32>,
    pub verificado_en: Option<DateTime<Utc>>,
    pub creado_por_usuario_id: Option<i32>,
    pub fecha: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Campos del formulario multipart (el archivo viaja aparte, en "comprobante").
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperacionBancariaPayload {
    pub tipo: TipoOperacion,

    #[validate(custom(function = "positive_amount"))]
    #[schema(value_type = String, example = "150000")]
    pub monto: Decimal,

    #[schema(value_type = Option<String>)]
    pub monto_a_cobrar: Option<Decimal>,

    #[validate(length(min = 1, max = 100, message = "El tipo de servicio debe tener entre 1 y 100 caracteres."))]
    pub tipo_servicio: String,

    pub moneda_pos: Option<Moneda>,

    #[schema(value_type = Option<String>)]
    pub monto_original: Option<Decimal>,

    pub pos_codigo_barra: Option<String>,

    pub caja_id: Uuid,

    pub cuenta_bancaria_id: Option<i32>,

    #[validate(length(max = 500, message = "La observación admite hasta 500 caracteres."))]
    pub observacion: Option<String>,

    #[serde(default)]
    pub crear_movimiento_farmacia: bool,
}

impl OperacionBancariaPayload {
    /// Validaciones del derive más las que dependen de varios campos.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        if let Some(monto) = &self.monto_a_cobrar {
            if let Err(e) = positive_amount(monto) {
                errors.add("monto_a_cobrar", e);
            }
        }
        if let Some(monto) = &self.monto_original {
            if let Err(e) = positive_amount(monto) {
                errors.add("monto_original", e);
            }
        }
        if self.tipo == TipoOperacion::Transferencia && self.cuenta_bancaria_id.is_none() {
            errors.add(
                "cuenta_bancaria_id",
                validation::required("Las transferencias requieren una cuenta bancaria."),
            );
        }

        validation::finish(errors)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificacionPayload {
    pub verificado: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OperacionesQuery {
    pub caja_id: Option<Uuid>,
}

/// Lo mínimo de la cuenta bancaria que hace falta para armar el concepto.
#[derive(Debug, Clone, FromRow)]
pub struct CuentaBancariaRef {
    pub id: i32,
    pub banco: String,
    pub numero_cuenta: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload(tipo: TipoOperacion) -> OperacionBancariaPayload {
        OperacionBancariaPayload {
            tipo,
            monto: dec!(150000),
            monto_a_cobrar: None,
            tipo_servicio: "Giros".to_string(),
            moneda_pos: None,
            monto_original: None,
            pos_codigo_barra: None,
            caja_id: Uuid::new_v4(),
            cuenta_bancaria_id: None,
            observacion: None,
            crear_movimiento_farmacia: false,
        }
    }

    #[test]
    fn transfer_without_bank_account_is_rejected() {
        let errors = payload(TipoOperacion::Transferencia).validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("cuenta_bancaria_id"));
    }

    #[test]
    fn pos_does_not_need_bank_account() {
        assert!(payload(TipoOperacion::Pos).validate_all().is_ok());
    }

    #[test]
    fn non_positive_amounts_are_reported_per_field() {
        let mut p = payload(TipoOperacion::Pos);
        p.monto = dec!(0);
        p.monto_a_cobrar = Some(dec!(-1));
        p.tipo_servicio = String::new();

        let errors = p.validate_all().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("monto"));
        assert!(fields.contains_key("monto_a_cobrar"));
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn form_fields_deserialize_from_strings() {
        let json = serde_json::json!({
            "tipo": "pos",
            "monto": "150000",
            "tipoServicio": "Cobro POS",
            "monedaPos": "USD",
            "montoOriginal": "20.50",
            "cajaId": "6f1c0e0e-4e9b-4d43-9a57-0c5b4d3f9a10",
            "crearMovimientoFarmacia": true
        });
        let p: OperacionBancariaPayload = serde_json::from_value(json).unwrap();
        assert_eq!(p.monto_original, Some(dec!(20.50)));
        assert_eq!(p.moneda_pos, Some(Moneda::USD));
        assert!(p.crear_movimiento_farmacia);
    }
}

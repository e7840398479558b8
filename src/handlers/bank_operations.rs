// src/handlers/bank_operations.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::HashMap, str::FromStr};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::{
    common::{error::AppError, extract::ValidatedJson, uploads::UploadedFile, validation},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermOperacionesVerificar, RequirePermission},
    },
    models::{
        bank_operations::{
            OperacionBancaria, OperacionBancariaPayload, OperacionesQuery, TipoOperacion,
            VerificacionPayload,
        },
        currency::Moneda,
    },
};

const RECEIPT_FIELD: &str = "comprobante";

/// Convierte los campos de texto del formulario al payload tipado.
/// Vacíos, "null" y "undefined" cuentan como ausentes. Los campos faltantes o
/// ilegibles se informan uno por uno, igual que los errores de validación.
pub fn form_to_payload(fields: Vec<(String, String)>) -> Result<OperacionBancariaPayload, AppError> {
    let mut form: HashMap<String, String> = fields
        .into_iter()
        .map(|(name, raw)| (name, raw.trim().to_string()))
        .filter(|(_, value)| !value.is_empty() && value != "null" && value != "undefined")
        .collect();
    let mut errors = ValidationErrors::new();

    let tipo = require_field(
        enum_field::<TipoOperacion>(&mut form, "tipo", "tipo", &mut errors),
        "tipo",
        "El tipo de operación es obligatorio (pos o transferencia).",
        &mut errors,
    );
    let monto = require_field(
        parsed_field::<Decimal>(&mut form, "monto", "monto", &mut errors),
        "monto",
        "El monto es obligatorio.",
        &mut errors,
    );
    let tipo_servicio = form.remove("tipoServicio");
    if tipo_servicio.is_none() {
        errors.add("tipo_servicio", validation::required("El tipo de servicio es obligatorio."));
    }
    let caja_id = require_field(
        parsed_field::<Uuid>(&mut form, "cajaId", "caja_id", &mut errors),
        "caja_id",
        "La caja es obligatoria.",
        &mut errors,
    );

    let monto_a_cobrar = parsed_field::<Decimal>(&mut form, "montoACobrar", "monto_a_cobrar", &mut errors);
    let moneda_pos = enum_field::<Moneda>(&mut form, "monedaPos", "moneda_pos", &mut errors);
    let monto_original = parsed_field::<Decimal>(&mut form, "montoOriginal", "monto_original", &mut errors);
    let cuenta_bancaria_id = parsed_field::<i32>(&mut form, "cuentaBancariaId", "cuenta_bancaria_id", &mut errors);
    let crear_movimiento_farmacia = form
        .remove("crearMovimientoFarmacia")
        .is_some_and(|v| matches!(v.as_str(), "true" | "1" | "on"));

    match (tipo, monto, tipo_servicio, caja_id) {
        (Some(tipo), Some(monto), Some(tipo_servicio), Some(caja_id)) if errors.errors().is_empty() => {
            Ok(OperacionBancariaPayload {
                tipo,
                monto,
                monto_a_cobrar,
                tipo_servicio,
                moneda_pos,
                monto_original,
                pos_codigo_barra: form.remove("posCodigoBarra"),
                caja_id,
                cuenta_bancaria_id,
                observacion: form.remove("observacion"),
                crear_movimiento_farmacia,
            })
        }
        _ => Err(AppError::ValidationError(errors)),
    }
}

// Marca como obligatorio un campo ausente (si vino pero no se pudo leer, ya tiene su error).
fn require_field<T>(
    value: Option<T>,
    key: &'static str,
    message: &'static str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    if value.is_none() && !errors.field_errors().contains_key(key) {
        errors.add(key, validation::required(message));
    }
    value
}

fn parsed_field<T: FromStr>(
    form: &mut HashMap<String, String>,
    name: &str,
    key: &'static str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = form.remove(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(key, validation::invalid("El valor no tiene el formato esperado."));
            None
        }
    }
}

fn enum_field<T: DeserializeOwned>(
    form: &mut HashMap<String, String>,
    name: &str,
    key: &'static str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = form.remove(name)?;
    match serde_json::from_value(Value::String(raw)) {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(key, validation::invalid("Valor no admitido."));
            None
        }
    }
}

async fn read_form(
    mut multipart: Multipart,
) -> Result<(OperacionBancariaPayload, Option<UploadedFile>), AppError> {
    let mut fields = Vec::new();
    let mut comprobante = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Formulario multipart inválido: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == RECEIPT_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("No se pudo leer el comprobante: {}", e)))?;
            if !bytes.is_empty() {
                comprobante = Some(UploadedFile { file_name, bytes: bytes.to_vec() });
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(format!("Campo '{}' ilegible: {}", name, e)))?;
        fields.push((name, text));
    }

    let payload = form_to_payload(fields)?;
    payload.validate_all().map_err(AppError::ValidationError)?;

    Ok((payload, comprobante))
}

#[utoipa::path(
    post,
    path = "/api/operaciones-bancarias",
    tag = "Operaciones bancarias",
    request_body(content = OperacionBancariaPayload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Operación creada", body = OperacionBancaria),
        (status = 400, description = "Datos inválidos"),
        (status = 404, description = "Caja o cuenta bancaria inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_operation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (payload, comprobante) = read_form(multipart).await?;

    let operacion = app_state.bank_operation_service
        .create(payload, comprobante, user.id)
        .await?;

    Ok((StatusCode::CREATED, Json(operacion)))
}

#[utoipa::path(
    put,
    path = "/api/operaciones-bancarias/{id}",
    tag = "Operaciones bancarias",
    request_body(content = OperacionBancariaPayload, content_type = "multipart/form-data"),
    params(("id" = Uuid, Path, description = "ID de la operación")),
    responses(
        (status = 200, description = "Operación actualizada", body = OperacionBancaria),
        (status = 404, description = "Operación, caja o cuenta inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_operation(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<OperacionBancaria>, AppError> {
    let (payload, comprobante) = read_form(multipart).await?;

    let operacion = app_state.bank_operation_service
        .update(id, payload, comprobante, user.id)
        .await?;

    Ok(Json(operacion))
}

#[utoipa::path(
    delete,
    path = "/api/operaciones-bancarias/{id}",
    tag = "Operaciones bancarias",
    params(("id" = Uuid, Path, description = "ID de la operación")),
    responses(
        (status = 204, description = "Operación y movimiento vinculado eliminados"),
        (status = 404, description = "Operación inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_operation(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.bank_operation_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/operaciones-bancarias",
    tag = "Operaciones bancarias",
    params(OperacionesQuery),
    responses(
        (status = 200, description = "Operaciones, más recientes primero", body = Vec<OperacionBancaria>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_operations(
    State(app_state): State<AppState>,
    Query(query): Query<OperacionesQuery>,
) -> Result<Json<Vec<OperacionBancaria>>, AppError> {
    let operaciones = app_state.bank_operation_service.list(query.caja_id).await?;
    Ok(Json(operaciones))
}

#[utoipa::path(
    get,
    path = "/api/operaciones-bancarias/{id}",
    tag = "Operaciones bancarias",
    params(("id" = Uuid, Path, description = "ID de la operación")),
    responses(
        (status = 200, description = "Operación", body = OperacionBancaria),
        (status = 404, description = "Operación inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_operation(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OperacionBancaria>, AppError> {
    let operacion = app_state.bank_operation_service.get(id).await?;
    Ok(Json(operacion))
}

#[utoipa::path(
    put,
    path = "/api/operaciones-bancarias/{id}/verificacion",
    tag = "Operaciones bancarias",
    request_body = VerificacionPayload,
    params(("id" = Uuid, Path, description = "ID de la operación")),
    responses(
        (status = 200, description = "Estado de verificación actualizado", body = OperacionBancaria),
        (status = 403, description = "Falta el permiso operaciones:verificar"),
        (status = 404, description = "Operación inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_verification(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermOperacionesVerificar>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VerificacionPayload>,
) -> Result<Json<OperacionBancaria>, AppError> {
    let operacion = app_state.bank_operation_service
        .set_verification(id, payload.verificado, user.id)
        .await?;

    Ok(Json(operacion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn field(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn form_fields_become_a_typed_payload() {
        let payload = form_to_payload(vec![
            field("tipo", "transferencia"),
            field("monto", "250000"),
            field("montoACobrar", ""),
            field("tipoServicio", "Giros Tigo"),
            field("cajaId", "6f1c0e0e-4e9b-4d43-9a57-0c5b4d3f9a10"),
            field("cuentaBancariaId", "3"),
            field("monedaPos", "null"),
            field("crearMovimientoFarmacia", "true"),
        ])
        .unwrap();

        assert_eq!(payload.tipo, TipoOperacion::Transferencia);
        assert_eq!(payload.monto, dec!(250000));
        assert_eq!(payload.monto_a_cobrar, None);
        assert_eq!(payload.moneda_pos, None);
        assert_eq!(payload.cuenta_bancaria_id, Some(3));
        assert!(payload.crear_movimiento_farmacia);
    }

    #[test]
    fn pos_form_with_foreign_currency() {
        let payload = form_to_payload(vec![
            field("tipo", "pos"),
            field("monto", "150000"),
            field("tipoServicio", "Cobro"),
            field("cajaId", "6f1c0e0e-4e9b-4d43-9a57-0c5b4d3f9a10"),
            field("monedaPos", "USD"),
            field("montoOriginal", "20.5"),
            field("crearMovimientoFarmacia", "false"),
        ])
        .unwrap();

        assert_eq!(payload.moneda_pos, Some(Moneda::USD));
        assert_eq!(payload.monto_original, Some(dec!(20.5)));
        assert!(!payload.crear_movimiento_farmacia);
    }

    fn field_errors(err: AppError) -> Vec<String> {
        match err {
            AppError::ValidationError(errors) => {
                let mut keys: Vec<String> =
                    errors.field_errors().keys().map(|k| k.to_string()).collect();
                keys.sort_unstable();
                keys
            }
            other => panic!("se esperaba un error de validación, llegó {other:?}"),
        }
    }

    #[test]
    fn missing_required_fields_are_reported_per_field() {
        let err = form_to_payload(vec![field("tipo", "pos"), field("monto", "10")]).unwrap_err();
        assert_eq!(field_errors(err), vec!["caja_id", "tipo_servicio"]);
    }

    #[test]
    fn unreadable_values_are_reported_per_field() {
        let err = form_to_payload(vec![
            field("tipo", "cheque"),
            field("monto", "diez"),
            field("tipoServicio", "Cobro"),
            field("cajaId", "6f1c0e0e-4e9b-4d43-9a57-0c5b4d3f9a10"),
            field("monedaPos", "EUR"),
        ])
        .unwrap_err();
        assert_eq!(field_errors(err), vec!["moneda_pos", "monto", "tipo"]);
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::currency::Moneda;

// Tipo de error único de la aplicación. Cada variante sabe cómo convertirse
// en respuesta HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de validación")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Solicitud inválida: {0}")]
    BadRequest(String),

    // La API histórica responde 400 (no 409) ante claves duplicadas.
    #[error("Registro duplicado: {0}")]
    Conflict(String),

    #[error("No encontrado: {0}")]
    NotFound(String),

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acceso denegado: {0}")]
    Forbidden(String),

    #[error("El mes ya está finalizado")]
    MonthAlreadyFinalized,

    #[error("El mes no está finalizado")]
    MonthNotFinalized,

    #[error("Falta la cotización de {0}")]
    MissingExchangeRate(Moneda),

    #[error("Error de base de datos: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Error interno del servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Error de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Error de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Error de archivo: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::Conflict(_)
            | AppError::MonthAlreadyFinalized
            | AppError::MonthNotFinalized
            | AppError::MissingExchangeRate(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduce violaciones de unicidad de Postgres a `Conflict`; el resto
    /// queda como error de base de datos.
    pub fn from_unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return AppError::Conflict(message.to_string());
            }
        }
        e.into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_message = match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Uno o más campos son inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::BadRequest(msg) => msg,
            AppError::Conflict(msg) => msg,
            AppError::NotFound(msg) => msg,
            AppError::InvalidCredentials => "Usuario o contraseña incorrectos.".to_string(),
            AppError::InvalidToken => "Token de autenticación inválido o ausente.".to_string(),
            AppError::Forbidden(msg) => msg,
            AppError::MonthAlreadyFinalized => "El mes ya fue finalizado.".to_string(),
            AppError::MonthNotFinalized => "El mes no existe o no está finalizado.".to_string(),
            AppError::MissingExchangeRate(moneda) => {
                format!("Falta la cotización de {} para convertir el saldo.", moneda)
            }

            // Todo lo demás es 500: el detalle va al log, nunca al cliente.
            ref e => {
                tracing::error!("Error interno del servidor: {}", e);
                "Ocurrió un error inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::borrow::Cow;
    use validator::{ValidationError, ValidationErrors};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "monto",
            ValidationError::new("positivo").with_message(Cow::from("El monto debe ser mayor a cero.")),
        );

        let response = AppError::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["details"]["monto"][0], "El monto debe ser mayor a cero.");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let response = AppError::InternalServerError(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Ocurrió un error inesperado.");
    }

    #[tokio::test]
    async fn not_found_message_is_passed_through() {
        let response = AppError::NotFound("La caja no existe.".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "La caja no existe.");
    }

    #[test]
    fn status_mapping_follows_error_taxonomy() {
        assert_eq!(AppError::NotFound("Caja".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MonthAlreadyFinalized.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MonthNotFinalized.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
    }
}

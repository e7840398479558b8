// src/common/extract.rs

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::common::error::AppError;

/// `Json<T>` que además corre `validate()`. Cualquier cuerpo mal formado o con
/// campos faltantes termina en 400 con el formato de `AppError`.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value.validate()?;

        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let motivo = match &rejection {
        JsonRejection::JsonDataError(_) => "faltan campos o tienen un tipo incorrecto",
        JsonRejection::JsonSyntaxError(_) => "el JSON está mal formado",
        JsonRejection::MissingJsonContentType(_) => "se esperaba Content-Type: application/json",
        _ => "no se pudo leer el cuerpo",
    };
    AppError::BadRequest(format!("Cuerpo inválido: {} ({}).", motivo, rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest, StatusCode},
        response::IntoResponse,
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct Periodo {
        persona_id: i32,
        #[validate(range(min = 1, max = 12, message = "El mes debe estar entre 1 y 12."))]
        mes: i16,
    }

    async fn handler(ValidatedJson(periodo): ValidatedJson<Periodo>) -> impl IntoResponse {
        format!("{}-{}", periodo.persona_id, periodo.mes)
    }

    async fn send(body: &'static str, content_type: &str) -> (StatusCode, serde_json::Value) {
        let response = Router::new()
            .route("/", post(handler))
            .oneshot(
                HttpRequest::post("/")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn missing_field_is_a_bad_request_with_json_body() {
        let (status, body) = send(r#"{"mes":5}"#, "application/json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("personaId"));
    }

    #[tokio::test]
    async fn wrong_type_and_bad_syntax_are_bad_requests() {
        let (status, _) = send(r#"{"personaId":"x","mes":5}"#, "application/json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(r#"{"personaId":1,"#, "application/json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(r#"{"personaId":1,"mes":5}"#, "text/plain").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validation_errors_keep_field_details() {
        let (status, body) = send(r#"{"personaId":1,"mes":13}"#, "application/json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["mes"].is_array());
    }
}

// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Públicas
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/cambiar-password", post(handlers::auth::change_password))
        .merge(
            Router::new()
                .route("/me", get(handlers::auth::get_me))
                .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard)),
        );

    let bank_operation_routes = Router::new()
        .route(
            "/",
            post(handlers::bank_operations::create_operation)
                .get(handlers::bank_operations::list_operations),
        )
        .route(
            "/{id}",
            get(handlers::bank_operations::get_operation)
                .put(handlers::bank_operations::update_operation)
                .delete(handlers::bank_operations::delete_operation),
        )
        .route("/{id}/verificacion", put(handlers::bank_operations::set_verification))
        .layer(DefaultBodyLimit::max(app_state.max_upload_bytes));

    let service_payment_routes = Router::new()
        .route(
            "/",
            post(handlers::service_payments::create_payment)
                .get(handlers::service_payments::list_payments),
        )
        .route(
            "/{id}",
            get(handlers::service_payments::get_payment)
                .put(handlers::service_payments::update_payment)
                .delete(handlers::service_payments::delete_payment),
        );

    let hr_routes = Router::new()
        .route("/movimientos", post(handlers::hr::create_movement))
        .route(
            "/movimientos/{id}",
            get(handlers::hr::get_month_movements).delete(handlers::hr::delete_movement),
        )
        .route("/finalizar-mes", post(handlers::hr::finalize_month))
        .route("/reabrir-mes", post(handlers::hr::reopen_month));

    // Todo lo que sigue exige token
    let protected = Router::new()
        .route("/permisos", get(handlers::rbac::list_permissions))
        .route("/movimientos-farmacia", get(handlers::pharmacy::list_movements))
        .nest("/operaciones-bancarias", bank_operation_routes)
        .nest("/pagos-servicios", service_payment_routes)
        .nest("/rrhh", hr_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, models::auth::Usuario};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // Pool perezoso: las rutas probadas acá cortan antes de tocar la base.
    fn state() -> AppState {
        let config = Config::from_source(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost:1/farmacia_test".to_string()),
            "JWT_SECRET" => Some("secreto-de-prueba".to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::from_pool(&config, pool)
    }

    fn token(state: &AppState) -> String {
        let usuario = Usuario {
            id: 1,
            username: "admin".into(),
            nombre: None,
            password_hash: String::new(),
            rol_id: 1,
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.auth_service.create_token(&usuario).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = build_router(state())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_bearer_token() {
        for uri in [
            "/api/operaciones-bancarias",
            "/api/movimientos-farmacia",
            "/api/pagos-servicios",
            "/api/rrhh/movimientos/42?mes=5&anio=2025",
            "/api/auth/me",
        ] {
            let response = build_router(state())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let response = build_router(state())
            .oneshot(
                Request::get("/api/operaciones-bancarias")
                    .header(header::AUTHORIZATION, "Bearer no-es-un-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_returns_token_claims() {
        let state = state();
        let token = token(&state);

        let response = build_router(state)
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["username"], "admin");
        assert_eq!(body["rolId"], 1);
    }

    #[tokio::test]
    async fn finalize_with_invalid_month_is_rejected_before_the_database() {
        let state = state();
        let token = token(&state);

        let response = build_router(state)
            .oneshot(
                Request::post("/api/rrhh/finalizar-mes")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"personaId":42,"mes":13,"anio":2025}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["details"]["mes"].is_array());
    }

    #[tokio::test]
    async fn hr_movement_with_zero_amount_is_a_validation_error() {
        let state = state();
        let token = token(&state);

        let response = build_router(state)
            .oneshot(
                Request::post("/api/rrhh/movimientos")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"personaId":42,"mes":5,"anio":2025,"tipo":"Descuento","monto":"0"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn post_json(uri: &str, body: &'static str) -> Response {
        let state = state();
        let token = token(&state);

        build_router(state)
            .oneshot(
                Request::post(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn finalize_without_persona_is_a_bad_request() {
        let response = post_json("/api/rrhh/finalizar-mes", r#"{"mes":5,"anio":2025}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("personaId"));
    }

    #[tokio::test]
    async fn finalize_with_negative_rate_is_a_validation_error() {
        let response = post_json(
            "/api/rrhh/finalizar-mes",
            r#"{"personaId":42,"mes":5,"anio":2025,"totales":{"USD":"100"},"cotizaciones":[{"moneda":"USD","valor":"-7300"}]}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["details"]["cotizaciones"].is_array());
    }

    #[tokio::test]
    async fn service_payment_with_wrong_amount_type_is_a_bad_request() {
        let response = post_json(
            "/api/pagos-servicios",
            r#"{"cajaId":"6f1c0e0e-4e9b-4d43-9a57-0c5b4d3f9a10","tipoServicio":"ANDE","monto":true}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn openapi_document_lists_the_month_endpoints() {
        let response = build_router(state())
            .oneshot(Request::get("/api/docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["paths"]["/api/rrhh/finalizar-mes"].is_object());
        assert!(body["paths"]["/api/operaciones-bancarias/{id}/verificacion"].is_object());
    }
}

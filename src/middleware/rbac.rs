// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

/// Un permiso del catálogo, identificado por su slug.
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Extractor que corta con 403 si el rol del usuario no tiene `T`.
/// Va detrás de `auth_guard`.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let AuthenticatedUser(claims) = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        app_state
            .rbac_service
            .ensure_permission(claims.rol_id, T::slug())
            .await?;

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// PERMISOS
// ---

pub struct PermOperacionesVerificar;
impl PermissionDef for PermOperacionesVerificar {
    fn slug() -> &'static str { "operaciones:verificar" }
}

pub struct PermRrhhReabrir;
impl PermissionDef for PermRrhhReabrir {
    fn slug() -> &'static str { "rrhh:reabrir" }
}

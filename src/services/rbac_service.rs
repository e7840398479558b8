// src/services/rbac_service.rs

use crate::common::error::AppError;
use crate::db::RbacRepository;
use crate::models::rbac::Permiso;

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
}

impl RbacService {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permiso>, AppError> {
        self.repo.list_all_permissions().await
    }

    /// `Forbidden` si el rol no tiene el permiso `slug`.
    pub async fn ensure_permission(&self, rol_id: i32, slug: &str) -> Result<(), AppError> {
        if self.repo.role_has_permission(rol_id, slug).await? {
            return Ok(());
        }

        tracing::warn!("Rol {} sin permiso '{}'", rol_id, slug);
        Err(AppError::Forbidden(format!(
            "Necesitás el permiso '{}' para realizar esta acción.",
            slug
        )))
    }
}

// src/db/rbac_repo.rs

use sqlx::PgPool;
use crate::common::error::AppError;
use crate::models::rbac::Permiso;

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Catálogo completo de permisos (para que el frontend arme la pantalla de roles)
    pub async fn list_all_permissions(&self) -> Result<Vec<Permiso>, AppError> {
        let permissions = sqlx::query_as::<_, Permiso>(
            "SELECT id, slug, descripcion, modulo FROM permisos ORDER BY modulo, slug",
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(permissions)
    }

    pub async fn role_has_permission(
        &self,
        rol_id: i32,
        permission_slug: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM rol_permisos rp
                JOIN permisos p ON rp.permiso_id = p.id
                WHERE rp.rol_id = $1
                  AND p.slug = $2
            )
            "#,
        )
            .bind(rol_id)
            .bind(permission_slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}

// src/db/user_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use crate::{common::error::AppError, models::auth::Usuario};

// Repositorio de usuarios: todo lo que toca la tabla 'usuarios'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // El login no distingue mayúsculas/minúsculas en el nombre de usuario
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Usuario>, AppError> {
        let maybe_user = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, username, nombre, password_hash, rol_id, activo, created_at, updated_at
            FROM usuarios
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn update_password<'e, E>(
        &self,
        executor: E,
        user_id: i32,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE usuarios
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
            .bind(password_hash)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(())
    }
}

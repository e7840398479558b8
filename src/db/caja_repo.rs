// src/db/caja_repo.rs

use sqlx::PgPool;
use uuid::Uuid;
use crate::common::error::AppError;

// Las cajas se abren y cierran en otro módulo; acá solo se consultan.
#[derive(Clone)]
pub struct CajaRepository {
    pool: PgPool,
}

impl CajaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, caja_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM cajas WHERE id = $1)",
        )
            .bind(caja_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}

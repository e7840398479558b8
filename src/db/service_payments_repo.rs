// src/db/service_payments_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;
use crate::{
    common::error::AppError,
    models::service_payments::{CreatePagoServicioPayload, PagoServicio},
};

#[derive(Clone)]
pub struct ServicePaymentsRepository {
    pool: PgPool,
}

impl ServicePaymentsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, caja_id: Option<Uuid>) -> Result<Vec<PagoServicio>, AppError> {
        let pagos = sqlx::query_as::<_, PagoServicio>(
            r#"
            SELECT * FROM pagos_servicios
            WHERE ($1::uuid IS NULL OR caja_id = $1)
            ORDER BY fecha DESC
            "#,
        )
            .bind(caja_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(pagos)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        input: &CreatePagoServicioPayload,
        usuario_id: i32,
    ) -> Result<PagoServicio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, PagoServicio>(
            r#"
            INSERT INTO pagos_servicios (caja_id, tipo_servicio, moneda, monto, observacion, usuario_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(input.caja_id)
            .bind(&input.tipo_servicio)
            .bind(input.moneda)
            .bind(input.monto)
            .bind(input.observacion.as_deref())
            .bind(usuario_id)
            .fetch_one(executor)
            .await?;

        Ok(pago)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<PagoServicio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, PagoServicio>("SELECT * FROM pagos_servicios WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(pago)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &CreatePagoServicioPayload,
    ) -> Result<Option<PagoServicio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pago = sqlx::query_as::<_, PagoServicio>(
            r#"
            UPDATE pagos_servicios
            SET caja_id = $1, tipo_servicio = $2, moneda = $3, monto = $4, observacion = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
            .bind(input.caja_id)
            .bind(&input.tipo_servicio)
            .bind(input.moneda)
            .bind(input.monto)
            .bind(input.observacion.as_deref())
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(pago)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM pagos_servicios WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

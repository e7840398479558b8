// src/db/pharmacy_repo.rs

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;
use crate::{
    common::error::AppError,
    models::pharmacy::{MovimientoFarmacia, NuevoMovimientoFarmacia},
};

// Libro de movimientos de farmacia (ingresos/egresos independientes de la caja)
#[derive(Clone)]
pub struct PharmacyRepository {
    pool: PgPool,
}

impl PharmacyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        desde: Option<NaiveDate>,
        hasta: Option<NaiveDate>,
    ) -> Result<Vec<MovimientoFarmacia>, AppError> {
        let movimientos = sqlx::query_as::<_, MovimientoFarmacia>(
            r#"
            SELECT * FROM movimientos_farmacia
            WHERE ($1::date IS NULL OR fecha::date >= $1)
              AND ($2::date IS NULL OR fecha::date <= $2)
            ORDER BY fecha DESC
            "#,
        )
            .bind(desde)
            .bind(hasta)
            .fetch_all(&self.pool)
            .await?;

        Ok(movimientos)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        input: &NuevoMovimientoFarmacia,
    ) -> Result<MovimientoFarmacia, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimiento = sqlx::query_as::<_, MovimientoFarmacia>(
            r#"
            INSERT INTO movimientos_farmacia (
                concepto, moneda, monto, origen,
                operacion_bancaria_id, pago_servicio_id, usuario_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(&input.concepto)
            .bind(input.moneda)
            .bind(input.monto)
            .bind(input.origen)
            .bind(input.operacion_bancaria_id)
            .bind(input.pago_servicio_id)
            .bind(input.usuario_id)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                AppError::from_unique_violation(e, "El registro ya tiene un movimiento de farmacia vinculado.")
            })?;

        Ok(movimiento)
    }

    pub async fn find_by_service_payment<'e, E>(
        &self,
        executor: E,
        pago_id: Uuid,
    ) -> Result<Option<MovimientoFarmacia>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimiento = sqlx::query_as::<_, MovimientoFarmacia>(
            "SELECT * FROM movimientos_farmacia WHERE pago_servicio_id = $1",
        )
            .bind(pago_id)
            .fetch_optional(executor)
            .await?;

        Ok(movimiento)
    }

    pub async fn find_by_bank_operation<'e, E>(
        &self,
        executor: E,
        operacion_id: Uuid,
    ) -> Result<Option<MovimientoFarmacia>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimiento = sqlx::query_as::<_, MovimientoFarmacia>(
            "SELECT * FROM movimientos_farmacia WHERE operacion_bancaria_id = $1",
        )
            .bind(operacion_id)
            .fetch_optional(executor)
            .await?;

        Ok(movimiento)
    }

    // Solo cambian concepto, moneda y monto; el vínculo queda igual.
    pub async fn update_amounts<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &NuevoMovimientoFarmacia,
    ) -> Result<MovimientoFarmacia, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimiento = sqlx::query_as::<_, MovimientoFarmacia>(
            r#"
            UPDATE movimientos_farmacia
            SET concepto = $1, moneda = $2, monto = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
            .bind(&input.concepto)
            .bind(input.moneda)
            .bind(input.monto)
            .bind(id)
            .fetch_one(executor)
            .await?;

        Ok(movimiento)
    }

    pub async fn delete_by_bank_operation<'e, E>(
        &self,
        executor: E,
        operacion_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM movimientos_farmacia WHERE operacion_bancaria_id = $1")
            .bind(operacion_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_by_service_payment<'e, E>(
        &self,
        executor: E,
        pago_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM movimientos_farmacia WHERE pago_servicio_id = $1")
            .bind(pago_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

// src/db/bank_operations_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;
use crate::{
    common::error::AppError,
    models::bank_operations::{CuentaBancariaRef, OperacionBancaria, OperacionBancariaPayload},
};

#[derive(Clone)]
pub struct BankOperationsRepository {
    pool: PgPool,
}

impl BankOperationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  REFERENCIAS (cuenta, POS)
    // =========================================================================

    pub async fn find_bank_account<'e, E>(
        &self,
        executor: E,
        cuenta_id: i32,
    ) -> Result<Option<CuentaBancariaRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cuenta = sqlx::query_as::<_, CuentaBancariaRef>(
            "SELECT id, banco, numero_cuenta FROM cuentas_bancarias WHERE id = $1",
        )
            .bind(cuenta_id)
            .fetch_optional(executor)
            .await?;

        Ok(cuenta)
    }

    pub async fn find_pos_device_name<'e, E>(
        &self,
        executor: E,
        codigo_barra: &str,
    ) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let nombre = sqlx::query_scalar::<_, String>(
            "SELECT nombre FROM dispositivos_pos WHERE codigo_barra = $1",
        )
            .bind(codigo_barra)
            .fetch_optional(executor)
            .await?;

        Ok(nombre)
    }

    // =========================================================================
    //  OPERACIONES
    // =========================================================================

    pub async fn list(&self, caja_id: Option<Uuid>) -> Result<Vec<OperacionBancaria>, AppError> {
        let operaciones = sqlx::query_as::<_, OperacionBancaria>(
            r#"
            SELECT * FROM operaciones_bancarias
            WHERE ($1::uuid IS NULL OR caja_id = $1)
            ORDER BY fecha DESC
            "#,
        )
            .bind(caja_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(operaciones)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<OperacionBancaria>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let operacion = sqlx::query_as::<_, OperacionBancaria>(
            "SELECT * FROM operaciones_bancarias WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(operacion)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        input: &OperacionBancariaPayload,
        comprobante: Option<&str>,
        usuario_id: i32,
    ) -> Result<OperacionBancaria, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let operacion = sqlx::query_as::<_, OperacionBancaria>(
            r#"
            INSERT INTO operaciones_bancarias (
                caja_id, tipo, monto, monto_a_cobrar, tipo_servicio,
                moneda_pos, monto_original, pos_codigo_barra, cuenta_bancaria_id,
                comprobante, observacion, creado_por_usuario_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
            .bind(input.caja_id)
            .bind(input.tipo)
            .bind(input.monto)
            .bind(input.monto_a_cobrar)
            .bind(&input.tipo_servicio)
            .bind(input.moneda_pos)
            .bind(input.monto_original)
            .bind(input.pos_codigo_barra.as_deref())
            .bind(input.cuenta_bancaria_id)
            .bind(comprobante)
            .bind(input.observacion.as_deref())
            .bind(usuario_id)
            .fetch_one(executor)
            .await?;

        Ok(operacion)
    }

    // `comprobante` ya viene resuelto: el nuevo archivo o el que estaba.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &OperacionBancariaPayload,
        comprobante: Option<&str>,
    ) -> Result<Option<OperacionBancaria>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let operacion = sqlx::query_as::<_, OperacionBancaria>(
            r#"
            UPDATE operaciones_bancarias
            SET caja_id = $1,
                tipo = $2,
                monto = $3,
                monto_a_cobrar = $4,
                tipo_servicio = $5,
                moneda_pos = $6,
                monto_original = $7,
                pos_codigo_barra = $8,
                cuenta_bancaria_id = $9,
                comprobante = $10,
                observacion = $11,
                updated_at = NOW()
            WHERE id = $12
            RETURNING *
            "#,
        )
            .bind(input.caja_id)
            .bind(input.tipo)
            .bind(input.monto)
            .bind(input.monto_a_cobrar)
            .bind(&input.tipo_servicio)
            .bind(input.moneda_pos)
            .bind(input.monto_original)
            .bind(input.pos_codigo_barra.as_deref())
            .bind(input.cuenta_bancaria_id)
            .bind(comprobante)
            .bind(input.observacion.as_deref())
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(operacion)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM operaciones_bancarias WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Última escritura gana; nunca crea filas.
    pub async fn set_verification(
        &self,
        id: Uuid,
        verificado: bool,
        usuario_id: i32,
    ) -> Result<Option<OperacionBancaria>, AppError> {
        let operacion = sqlx::query_as::<_, OperacionBancaria>(
            r#"
            UPDATE operaciones_bancarias
            SET verificado = $1,
                verificado_por_usuario_id = CASE WHEN $1 THEN $2 ELSE NULL END,
                verificado_en = CASE WHEN $1 THEN NOW() ELSE NULL END,
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
            .bind(verificado)
            .bind(usuario_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(operacion)
    }
}

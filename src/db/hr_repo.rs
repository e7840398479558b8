// src/db/hr_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Executor};
use crate::{
    common::error::AppError,
    models::{
        currency::Cotizacion,
        hr::{
            CreateMovimientoRrhhPayload, LineaMes, MovimientoRrhh, ResumenMes, Sueldo, TotalesMes,
            Vale,
        },
    },
};

#[derive(Clone)]
pub struct HrRepository {
    pool: PgPool,
}

impl HrRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // El servicio abre sus transacciones sobre este mismo pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn persona_exists<'e, E>(&self, executor: E, persona_id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM personas WHERE id = $1)",
        )
            .bind(persona_id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    /// Lock de transacción sobre (persona, periodo). Serializa altas/bajas de
    /// movimientos contra el cierre del mismo mes; se libera con commit/rollback.
    pub async fn lock_period<'e, E>(&self, executor: E, persona_id: i32, mes: i16, anio: i16) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(persona_id)
            .bind(i32::from(anio) * 100 + i32::from(mes))
            .execute(executor)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  MOVIMIENTOS VIVOS
    // =========================================================================

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        input: &CreateMovimientoRrhhPayload,
        fecha: NaiveDate,
        usuario_id: i32,
    ) -> Result<MovimientoRrhh, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimiento = sqlx::query_as::<_, MovimientoRrhh>(
            r#"
            INSERT INTO movimientos_rrhh (persona_id, mes, anio, tipo, moneda, monto, observacion, fecha, usuario_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(input.persona_id)
            .bind(input.mes)
            .bind(input.anio)
            .bind(input.tipo)
            .bind(input.moneda)
            .bind(input.monto)
            .bind(input.observacion.as_deref())
            .bind(fecha)
            .bind(usuario_id)
            .fetch_one(executor)
            .await?;

        Ok(movimiento)
    }

    pub async fn find_movement<'e, E>(&self, executor: E, id: i32) -> Result<Option<MovimientoRrhh>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimiento = sqlx::query_as::<_, MovimientoRrhh>(
            "SELECT * FROM movimientos_rrhh WHERE id = $1",
        )
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(movimiento)
    }

    pub async fn delete_movement<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM movimientos_rrhh WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn list_movements<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        mes: i16,
        anio: i16,
    ) -> Result<Vec<MovimientoRrhh>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimientos = sqlx::query_as::<_, MovimientoRrhh>(
            r#"
            SELECT * FROM movimientos_rrhh
            WHERE persona_id = $1 AND mes = $2 AND anio = $3
            ORDER BY fecha, id
            "#,
        )
            .bind(persona_id)
            .bind(mes)
            .bind(anio)
            .fetch_all(executor)
            .await?;

        Ok(movimientos)
    }

    pub async fn list_vouchers_due<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> Result<Vec<Vale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let vales = sqlx::query_as::<_, Vale>(
            r#"
            SELECT id, persona_id, fecha_vencimiento, motivo, moneda, monto, estado
            FROM vales
            WHERE persona_id = $1 AND fecha_vencimiento BETWEEN $2 AND $3
            ORDER BY fecha_vencimiento, id
            "#,
        )
            .bind(persona_id)
            .bind(desde)
            .bind(hasta)
            .fetch_all(executor)
            .await?;

        Ok(vales)
    }

    pub async fn find_salary<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        mes: i16,
        anio: i16,
    ) -> Result<Option<Sueldo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sueldo = sqlx::query_as::<_, Sueldo>(
            r#"
            SELECT id, persona_id, mes, anio, moneda, monto
            FROM sueldos
            WHERE persona_id = $1 AND mes = $2 AND anio = $3
            "#,
        )
            .bind(persona_id)
            .bind(mes)
            .bind(anio)
            .fetch_optional(executor)
            .await?;

        Ok(sueldo)
    }

    /// Sueldo mínimo vigente a `fecha`, solo si la persona está activa en IPS.
    pub async fn ips_minimum_wage<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        fecha: NaiveDate,
    ) -> Result<Option<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let monto = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT sm.monto
            FROM personas_ips pi
            JOIN LATERAL (
                SELECT monto FROM sueldos_minimos
                WHERE vigente_desde <= $2
                ORDER BY vigente_desde DESC
                LIMIT 1
            ) sm ON TRUE
            WHERE pi.persona_id = $1 AND pi.activo
            "#,
        )
            .bind(persona_id)
            .bind(fecha)
            .fetch_optional(executor)
            .await?;

        Ok(monto)
    }

    // =========================================================================
    //  RESUMEN DEL MES
    // =========================================================================

    pub async fn find_summary<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        mes: i16,
        anio: i16,
    ) -> Result<Option<ResumenMes>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let resumen = sqlx::query_as::<_, ResumenMes>(
            r#"
            SELECT id, persona_id, mes, anio, total_gs, total_usd, total_brl, total_final_gs,
                   cotizaciones_usadas, finalizado, finalizado_por, finalizado_en,
                   reabierto_por, reabierto_en
            FROM resumen_mes_rrhh
            WHERE persona_id = $1 AND mes = $2 AND anio = $3
            "#,
        )
            .bind(persona_id)
            .bind(mes)
            .bind(anio)
            .fetch_optional(executor)
            .await?;

        Ok(resumen)
    }

    pub async fn is_finalized<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        mes: i16,
        anio: i16,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let finalizado = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM resumen_mes_rrhh
                WHERE persona_id = $1 AND mes = $2 AND anio = $3 AND finalizado
            )
            "#,
        )
            .bind(persona_id)
            .bind(mes)
            .bind(anio)
            .fetch_one(executor)
            .await?;

        Ok(finalizado)
    }

    /// Inserta el resumen finalizado o lo actualiza si el mes estaba reabierto.
    /// Devuelve `None` cuando ya estaba finalizado: la condición vive en el
    /// mismo UPDATE, así dos cierres concurrentes no pueden pasar los dos.
    pub async fn upsert_finalized_summary<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        mes: i16,
        anio: i16,
        totales: &TotalesMes,
        cotizaciones: &[Cotizacion],
        usuario_id: i32,
    ) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO resumen_mes_rrhh (
                persona_id, mes, anio,
                total_gs, total_usd, total_brl, total_final_gs,
                cotizaciones_usadas, finalizado, finalizado_por, finalizado_en
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, NOW())
            ON CONFLICT (persona_id, mes, anio) DO UPDATE SET
                total_gs = EXCLUDED.total_gs,
                total_usd = EXCLUDED.total_usd,
                total_brl = EXCLUDED.total_brl,
                total_final_gs = EXCLUDED.total_final_gs,
                cotizaciones_usadas = EXCLUDED.cotizaciones_usadas,
                finalizado = TRUE,
                finalizado_por = EXCLUDED.finalizado_por,
                finalizado_en = NOW(),
                updated_at = NOW()
            WHERE resumen_mes_rrhh.finalizado = FALSE
            RETURNING id
            "#,
        )
            .bind(persona_id)
            .bind(mes)
            .bind(anio)
            .bind(totales.total_gs)
            .bind(totales.total_usd)
            .bind(totales.total_brl)
            .bind(totales.total_final_gs)
            .bind(sqlx::types::Json(cotizaciones.to_vec()))
            .bind(usuario_id)
            .fetch_optional(executor)
            .await?;

        Ok(id)
    }

    /// Pasa el resumen de finalizado a abierto. `None` si no existía o no estaba finalizado.
    pub async fn reopen_summary<'e, E>(
        &self,
        executor: E,
        persona_id: i32,
        mes: i16,
        anio: i16,
        usuario_id: i32,
    ) -> Result<Option<i32>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE resumen_mes_rrhh
            SET finalizado = FALSE,
                reabierto_por = $4,
                reabierto_en = NOW(),
                updated_at = NOW()
            WHERE persona_id = $1 AND mes = $2 AND anio = $3 AND finalizado
            RETURNING id
            "#,
        )
            .bind(persona_id)
            .bind(mes)
            .bind(anio)
            .bind(usuario_id)
            .fetch_optional(executor)
            .await?;

        Ok(id)
    }

    // =========================================================================
    //  COPIA CONGELADA DE LAS LÍNEAS
    // =========================================================================

    pub async fn delete_snapshot_lines<'e, E>(&self, executor: E, resumen_id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM movimientos_rrhh_finalizados WHERE resumen_mes_id = $1")
            .bind(resumen_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn insert_snapshot_line<'e, E>(
        &self,
        executor: E,
        resumen_id: i32,
        orden: i32,
        linea: &LineaMes,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO movimientos_rrhh_finalizados (
                resumen_mes_id, origen, origen_id, tipo, fecha, moneda, monto, monto_gs, observacion, orden
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
            .bind(resumen_id)
            .bind(linea.origen)
            .bind(linea.origen_id)
            .bind(&linea.tipo)
            .bind(linea.fecha)
            .bind(linea.moneda)
            .bind(linea.monto)
            .bind(linea.monto_gs)
            .bind(linea.observacion.as_deref())
            .bind(orden)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn list_snapshot_lines<'e, E>(&self, executor: E, resumen_id: i32) -> Result<Vec<LineaMes>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lineas = sqlx::query_as::<_, LineaMes>(
            r#"
            SELECT origen, origen_id, tipo, fecha, moneda, monto, monto_gs, observacion
            FROM movimientos_rrhh_finalizados
            WHERE resumen_mes_id = $1
            ORDER BY orden
            "#,
        )
            .bind(resumen_id)
            .fetch_all(executor)
            .await?;

        Ok(lineas)
    }
}

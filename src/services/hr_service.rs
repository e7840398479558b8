// src/services/hr_service.rs

use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;

use crate::{
    common::error::AppError,
    db::HrRepository,
    models::{
        currency::Cotizacion,
        hr::{
            CreateMovimientoRrhhPayload, FinalizarMesPayload, FinalizarMesResponse, MonthSources,
            MovimientoRrhh, MovimientosMesResponse, PeriodoPayload, TotalesMes,
        },
    },
    services::month_lines::{compute_totals, derive_month_lines, in_month, month_bounds},
};

#[derive(Clone)]
pub struct HrService {
    repo: HrRepository,
}

impl HrService {
    pub fn new(repo: HrRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  MOVIMIENTOS (solo en meses abiertos)
    // =========================================================================

    pub async fn create_movement(
        &self,
        input: CreateMovimientoRrhhPayload,
        usuario_id: i32,
    ) -> Result<MovimientoRrhh, AppError> {
        let (first_day, _) = period_bounds(input.mes, input.anio)?;

        let fecha = match input.fecha {
            Some(fecha) if in_month(fecha, input.mes, input.anio) => fecha,
            Some(_) => {
                return Err(AppError::BadRequest("La fecha no pertenece al mes indicado.".into()));
            }
            None => default_movement_date(Utc::now().date_naive(), input.mes, input.anio, first_day),
        };

        let mut tx = self.repo.pool().begin().await?;

        if !self.repo.persona_exists(&mut *tx, input.persona_id).await? {
            return Err(AppError::NotFound("Persona no encontrada.".into()));
        }

        self.repo.lock_period(&mut *tx, input.persona_id, input.mes, input.anio).await?;
        if self.repo.is_finalized(&mut *tx, input.persona_id, input.mes, input.anio).await? {
            return Err(AppError::MonthAlreadyFinalized);
        }

        let movimiento = self.repo
            .insert_movement(&mut *tx, &input, fecha, usuario_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Movimiento RRHH {} ({}) creado para persona {} en {}/{}",
            movimiento.id, movimiento.tipo.as_str(), movimiento.persona_id, movimiento.mes, movimiento.anio
        );
        Ok(movimiento)
    }

    pub async fn delete_movement(&self, id: i32) -> Result<(), AppError> {
        let mut tx = self.repo.pool().begin().await?;

        let movimiento = self.repo
            .find_movement(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Movimiento no encontrado.".into()))?;

        self.repo.lock_period(&mut *tx, movimiento.persona_id, movimiento.mes, movimiento.anio).await?;
        if self.repo.is_finalized(&mut *tx, movimiento.persona_id, movimiento.mes, movimiento.anio).await? {
            return Err(AppError::MonthAlreadyFinalized);
        }

        self.repo.delete_movement(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Movimiento RRHH {} eliminado", id);
        Ok(())
    }

    // =========================================================================
    //  CIERRE / REAPERTURA
    // =========================================================================

    /// Cierra el mes: guarda totales y cotizaciones, y congela las líneas.
    /// Todo ocurre en una sola transacción; un mes ya cerrado se rechaza
    /// dentro del mismo UPSERT.
    pub async fn finalize_month(
        &self,
        input: FinalizarMesPayload,
        usuario_id: i32,
    ) -> Result<FinalizarMesResponse, AppError> {
        period_bounds(input.mes, input.anio)?;
        let totales = compute_totals(&input.totales, &input.cotizaciones)?;

        let mut tx = self.repo.pool().begin().await?;

        if !self.repo.persona_exists(&mut *tx, input.persona_id).await? {
            return Err(AppError::NotFound("Persona no encontrada.".into()));
        }

        self.repo.lock_period(&mut *tx, input.persona_id, input.mes, input.anio).await?;

        let resumen_id = self.repo
            .upsert_finalized_summary(
                &mut *tx,
                input.persona_id,
                input.mes,
                input.anio,
                &totales,
                &input.cotizaciones,
                usuario_id,
            )
            .await?
            .ok_or(AppError::MonthAlreadyFinalized)?;

        let sources = self.load_sources(&mut tx, input.persona_id, input.mes, input.anio).await?;
        let lineas = derive_month_lines(input.mes, input.anio, &sources, &input.cotizaciones);

        self.repo.delete_snapshot_lines(&mut *tx, resumen_id).await?;
        for (orden, linea) in lineas.iter().enumerate() {
            let orden = i32::try_from(orden)
                .map_err(|_| anyhow::anyhow!("Demasiadas líneas en el resumen {}", resumen_id))?;
            self.repo.insert_snapshot_line(&mut *tx, resumen_id, orden, linea).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "🔒 Mes {}/{} finalizado para persona {} (resumen {}, {} líneas, total {} GS)",
            input.mes, input.anio, input.persona_id, resumen_id, lineas.len(), totales.total_final_gs
        );

        Ok(FinalizarMesResponse { resumen_id, totales })
    }

    /// Reabre un mes cerrado y descarta su copia congelada.
    pub async fn reopen_month(&self, input: PeriodoPayload, usuario_id: i32) -> Result<i32, AppError> {
        let mut tx = self.repo.pool().begin().await?;

        self.repo.lock_period(&mut *tx, input.persona_id, input.mes, input.anio).await?;

        let resumen_id = self.repo
            .reopen_summary(&mut *tx, input.persona_id, input.mes, input.anio, usuario_id)
            .await?
            .ok_or(AppError::MonthNotFinalized)?;

        let borradas = self.repo.delete_snapshot_lines(&mut *tx, resumen_id).await?;

        tx.commit().await?;

        tracing::info!(
            "🔓 Mes {}/{} reabierto para persona {} por usuario {} ({} líneas congeladas descartadas)",
            input.mes, input.anio, input.persona_id, usuario_id, borradas
        );
        Ok(resumen_id)
    }

    // =========================================================================
    //  LECTURA
    // =========================================================================

    /// Mes cerrado: la copia congelada tal cual. Mes abierto: líneas calculadas
    /// al vuelo, sin cotizaciones (solo las líneas en GS llevan `montoGs`).
    pub async fn get_month(&self, persona_id: i32, mes: i16, anio: i16) -> Result<MovimientosMesResponse, AppError> {
        period_bounds(mes, anio)?;

        let mut conn = self.repo.pool().acquire().await?;

        if !self.repo.persona_exists(&mut *conn, persona_id).await? {
            return Err(AppError::NotFound("Persona no encontrada.".into()));
        }

        let resumen = self.repo.find_summary(&mut *conn, persona_id, mes, anio).await?;

        if let Some(resumen) = resumen.as_ref().filter(|r| r.finalizado) {
            let movimientos = self.repo.list_snapshot_lines(&mut *conn, resumen.id).await?;
            return Ok(MovimientosMesResponse {
                persona_id,
                mes,
                anio,
                finalizado: true,
                resumen_id: Some(resumen.id),
                totales: Some(TotalesMes {
                    total_gs: resumen.total_gs,
                    total_usd: resumen.total_usd,
                    total_brl: resumen.total_brl,
                    total_final_gs: resumen.total_final_gs,
                }),
                cotizaciones: resumen.cotizaciones_usadas.0.clone(),
                movimientos,
            });
        }

        let resumen_id = resumen.map(|r| r.id);
        let sources = self.load_sources(&mut conn, persona_id, mes, anio).await?;
        let no_rates: &[Cotizacion] = &[];

        Ok(MovimientosMesResponse {
            persona_id,
            mes,
            anio,
            finalizado: false,
            resumen_id,
            totales: None,
            cotizaciones: Vec::new(),
            movimientos: derive_month_lines(mes, anio, &sources, no_rates),
        })
    }

    // Las cuatro fuentes del mes, leídas sobre la misma conexión.
    async fn load_sources(
        &self,
        conn: &mut PgConnection,
        persona_id: i32,
        mes: i16,
        anio: i16,
    ) -> Result<MonthSources, AppError> {
        let (first_day, last_day) = period_bounds(mes, anio)?;

        let movimientos = self.repo.list_movements(&mut *conn, persona_id, mes, anio).await?;
        let vales = self.repo.list_vouchers_due(&mut *conn, persona_id, first_day, last_day).await?;
        let sueldo = self.repo.find_salary(&mut *conn, persona_id, mes, anio).await?;
        let sueldo_minimo_ips = self.repo.ips_minimum_wage(&mut *conn, persona_id, last_day).await?;

        Ok(MonthSources { movimientos, vales, sueldo, sueldo_minimo_ips })
    }
}

fn period_bounds(mes: i16, anio: i16) -> Result<(NaiveDate, NaiveDate), AppError> {
    month_bounds(mes, anio).ok_or_else(|| AppError::BadRequest("Periodo inválido.".into()))
}

// Sin fecha explícita: hoy si cae en el mes, si no el primer día del mes.
fn default_movement_date(today: NaiveDate, mes: i16, anio: i16, first_day: NaiveDate) -> NaiveDate {
    if in_month(today, mes, anio) { today } else { first_day }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        currency::Moneda,
        hr::{OrigenLinea, SaldosMoneda, TipoMovimientoRrhh},
    };
    use rust_decimal_macros::dec;
    use sqlx::PgPool;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_date_is_today_only_inside_the_month() {
        let first = date(2025, 5, 1);
        assert_eq!(default_movement_date(date(2025, 5, 17), 5, 2025, first), date(2025, 5, 17));
        assert_eq!(default_movement_date(date(2025, 6, 2), 5, 2025, first), first);
    }

    #[test]
    fn invalid_period_is_a_bad_request() {
        assert!(matches!(period_bounds(13, 2025), Err(AppError::BadRequest(_))));
        assert!(period_bounds(5, 2025).is_ok());
    }

    // --- Flujos contra Postgres (cargo test -- --ignored) ---

    struct Fixture {
        persona_id: i32,
        usuario_id: i32,
    }

    // Persona 42 con un descuento de -50000 GS y un vale de 100 USD en mayo 2025.
    async fn seed(pool: &PgPool) -> Fixture {
        let rol_id: i32 = sqlx::query_scalar("INSERT INTO roles (nombre) VALUES ('rrhh') RETURNING id")
            .fetch_one(pool).await.unwrap();
        let usuario_id: i32 = sqlx::query_scalar(
            "INSERT INTO usuarios (username, password_hash, rol_id) VALUES ('rrhh1', 'x', $1) RETURNING id",
        )
            .bind(rol_id)
            .fetch_one(pool).await.unwrap();
        sqlx::query("INSERT INTO personas (id, nombre) VALUES (42, 'Persona 42')")
            .execute(pool).await.unwrap();
        sqlx::query(
            "INSERT INTO vales (persona_id, fecha_vencimiento, motivo, moneda, monto) \
             VALUES (42, '2025-05-20', 'Adelanto', 'USD', 100)",
        )
            .execute(pool).await.unwrap();

        Fixture { persona_id: 42, usuario_id }
    }

    fn service(pool: &PgPool) -> HrService {
        HrService::new(HrRepository::new(pool.clone()))
    }

    fn descuento(persona_id: i32) -> CreateMovimientoRrhhPayload {
        CreateMovimientoRrhhPayload {
            persona_id,
            mes: 5,
            anio: 2025,
            tipo: TipoMovimientoRrhh::Descuento,
            moneda: Moneda::GS,
            monto: dec!(-50000),
            observacion: Some("Faltante de caja".into()),
            fecha: Some(date(2025, 5, 3)),
        }
    }

    fn cierre(persona_id: i32) -> FinalizarMesPayload {
        FinalizarMesPayload {
            persona_id,
            mes: 5,
            anio: 2025,
            totales: SaldosMoneda { gs: dec!(-50000), usd: dec!(100), brl: dec!(0) },
            cotizaciones: vec![Cotizacion { moneda: Moneda::USD, valor: dec!(7300) }],
        }
    }

    fn periodo(persona_id: i32) -> PeriodoPayload {
        PeriodoPayload { persona_id, mes: 5, anio: 2025 }
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn finalize_snapshots_lines_and_read_returns_them(pool: PgPool) {
        let fx = seed(&pool).await;
        let svc = service(&pool);
        svc.create_movement(descuento(fx.persona_id), fx.usuario_id).await.unwrap();

        let resp = svc.finalize_month(cierre(fx.persona_id), fx.usuario_id).await.unwrap();
        assert_eq!(resp.totales.total_final_gs, dec!(680000));

        // Un movimiento nuevo no puede entrar en un mes cerrado
        let err = svc.create_movement(descuento(fx.persona_id), fx.usuario_id).await.unwrap_err();
        assert!(matches!(err, AppError::MonthAlreadyFinalized));

        // Filas vivas escritas por fuera del servicio no aparecen en un mes cerrado
        sqlx::query(
            "INSERT INTO movimientos_rrhh (persona_id, mes, anio, tipo, moneda, monto, fecha) \
             VALUES (42, 5, 2025, 'Multa', 'GS', -10000, '2025-05-10')",
        )
            .execute(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO vales (persona_id, fecha_vencimiento, motivo, moneda, monto) \
             VALUES (42, '2025-05-25', 'Tardío', 'GS', 20000)",
        )
            .execute(&pool).await.unwrap();

        let mes = svc.get_month(fx.persona_id, 5, 2025).await.unwrap();
        assert!(mes.finalizado);
        assert_eq!(mes.resumen_id, Some(resp.resumen_id));
        assert_eq!(mes.movimientos.len(), 2);
        let congeladas = HrRepository::new(pool.clone())
            .list_snapshot_lines(&pool, resp.resumen_id)
            .await
            .unwrap();
        assert_eq!(mes.movimientos, congeladas);
        assert_eq!(mes.movimientos[0].origen, OrigenLinea::Movimiento);
        assert_eq!(mes.movimientos[1].origen, OrigenLinea::Vale);
        assert_eq!(mes.movimientos[1].monto_gs, Some(dec!(730000)));
        assert_eq!(mes.totales.unwrap().total_final_gs, dec!(680000));
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn second_finalize_is_rejected(pool: PgPool) {
        let fx = seed(&pool).await;
        let svc = service(&pool);

        svc.finalize_month(cierre(fx.persona_id), fx.usuario_id).await.unwrap();
        let err = svc.finalize_month(cierre(fx.persona_id), fx.usuario_id).await.unwrap_err();
        assert!(matches!(err, AppError::MonthAlreadyFinalized));
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn reopen_then_refinalize_reproduces_totals(pool: PgPool) {
        let fx = seed(&pool).await;
        let svc = service(&pool);
        svc.create_movement(descuento(fx.persona_id), fx.usuario_id).await.unwrap();

        let first = svc.finalize_month(cierre(fx.persona_id), fx.usuario_id).await.unwrap();
        let reopened = svc.reopen_month(periodo(fx.persona_id), fx.usuario_id).await.unwrap();
        assert_eq!(reopened, first.resumen_id);

        // Reabierto: se lee de las tablas vivas y la copia congelada ya no existe
        let abierto = svc.get_month(fx.persona_id, 5, 2025).await.unwrap();
        assert!(!abierto.finalizado);
        assert!(abierto.totales.is_none());
        let congeladas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movimientos_rrhh_finalizados")
            .fetch_one(&pool).await.unwrap();
        assert_eq!(congeladas, 0);

        let second = svc.finalize_month(cierre(fx.persona_id), fx.usuario_id).await.unwrap();
        assert_eq!(second.resumen_id, first.resumen_id);
        assert_eq!(
            serde_json::to_string(&second.totales).unwrap(),
            serde_json::to_string(&first.totales).unwrap()
        );
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn reopening_an_open_or_missing_month_changes_nothing(pool: PgPool) {
        let fx = seed(&pool).await;
        let svc = service(&pool);

        let err = svc.reopen_month(periodo(fx.persona_id), fx.usuario_id).await.unwrap_err();
        assert!(matches!(err, AppError::MonthNotFinalized));

        let resumenes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resumen_mes_rrhh")
            .fetch_one(&pool).await.unwrap();
        assert_eq!(resumenes, 0);
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn ips_line_uses_minimum_wage_effective_at_month_end(pool: PgPool) {
        let fx = seed(&pool).await;
        sqlx::query("INSERT INTO personas_ips (persona_id) VALUES (42)")
            .execute(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO sueldos_minimos (monto, vigente_desde) VALUES (2680373, '2024-07-01'), (2798309, '2025-07-01')",
        )
            .execute(&pool).await.unwrap();

        let mes = service(&pool).get_month(fx.persona_id, 5, 2025).await.unwrap();
        let ips = mes.movimientos.iter().find(|l| l.origen == OrigenLinea::Ips).unwrap();
        assert_eq!(ips.monto, dec!(-241233.57));
        assert_eq!(ips.fecha, date(2025, 5, 31));
    }
}

// src/services/service_payment_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CajaRepository, PharmacyRepository, ServicePaymentsRepository},
    models::{
        pharmacy::{NuevoMovimientoFarmacia, OrigenMovimiento},
        service_payments::{CreatePagoServicioPayload, PagoServicio},
    },
};

#[derive(Clone)]
pub struct ServicePaymentService {
    pool: PgPool,
    repo: ServicePaymentsRepository,
    caja_repo: CajaRepository,
    pharmacy_repo: PharmacyRepository,
}

impl ServicePaymentService {
    pub fn new(
        pool: PgPool,
        repo: ServicePaymentsRepository,
        caja_repo: CajaRepository,
        pharmacy_repo: PharmacyRepository,
    ) -> Self {
        Self { pool, repo, caja_repo, pharmacy_repo }
    }

    pub async fn list(&self, caja_id: Option<Uuid>) -> Result<Vec<PagoServicio>, AppError> {
        self.repo.list(caja_id).await
    }

    /// Registra el pago y su egreso en el libro de farmacia, todo o nada.
    pub async fn create(
        &self,
        input: CreatePagoServicioPayload,
        usuario_id: i32,
    ) -> Result<PagoServicio, AppError> {
        if !self.caja_repo.exists(input.caja_id).await? {
            return Err(AppError::NotFound("La caja no existe.".into()));
        }

        let mut tx = self.pool.begin().await?;

        let pago = self.repo.insert(&mut *tx, &input, usuario_id).await?;
        self.pharmacy_repo.insert(&mut *tx, &companion_movement(&pago, usuario_id)).await?;

        tx.commit().await?;

        tracing::info!("✅ Pago de servicio {} registrado ({} {})", pago.id, pago.monto, pago.moneda);
        Ok(pago)
    }

    pub async fn get(&self, id: Uuid) -> Result<PagoServicio, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Pago de servicio no encontrado.".into()))
    }

    /// Reescribe el pago y deja su egreso con el mismo concepto, moneda y monto.
    pub async fn update(
        &self,
        id: Uuid,
        input: CreatePagoServicioPayload,
        usuario_id: i32,
    ) -> Result<PagoServicio, AppError> {
        if !self.caja_repo.exists(input.caja_id).await? {
            return Err(AppError::NotFound("La caja no existe.".into()));
        }

        let mut tx = self.pool.begin().await?;

        let pago = self.repo
            .update(&mut *tx, id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound("Pago de servicio no encontrado.".into()))?;

        let movimiento = companion_movement(&pago, usuario_id);
        match self.pharmacy_repo.find_by_service_payment(&mut *tx, pago.id).await? {
            Some(actual) => {
                self.pharmacy_repo.update_amounts(&mut *tx, actual.id, &movimiento).await?;
            }
            None => {
                self.pharmacy_repo.insert(&mut *tx, &movimiento).await?;
            }
        }

        tx.commit().await?;

        tracing::info!("Pago de servicio {} actualizado ({} {})", pago.id, pago.monto, pago.moneda);
        Ok(pago)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.pharmacy_repo.delete_by_service_payment(&mut *tx, id).await?;

        if !self.repo.delete(&mut *tx, id).await? {
            return Err(AppError::NotFound("Pago de servicio no encontrado.".into()));
        }

        tx.commit().await?;

        tracing::info!("🗑️ Pago de servicio {} eliminado", id);
        Ok(())
    }
}

fn companion_movement(pago: &PagoServicio, usuario_id: i32) -> NuevoMovimientoFarmacia {
    NuevoMovimientoFarmacia {
        concepto: format!("Pago de servicio - {}", pago.tipo_servicio),
        moneda: pago.moneda,
        monto: -pago.monto,
        origen: OrigenMovimiento::PagoServicio,
        operacion_bancaria_id: None,
        pago_servicio_id: Some(pago.id),
        usuario_id: Some(usuario_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::currency::Moneda;
    use rust_decimal_macros::dec;

    async fn seed_caja(pool: &PgPool) -> (Uuid, i32) {
        let rol_id: i32 = sqlx::query_scalar("INSERT INTO roles (nombre) VALUES ('cajero') RETURNING id")
            .fetch_one(pool).await.unwrap();
        let usuario_id: i32 = sqlx::query_scalar(
            "INSERT INTO usuarios (username, password_hash, rol_id) VALUES ('caja1', 'x', $1) RETURNING id",
        )
            .bind(rol_id)
            .fetch_one(pool).await.unwrap();
        let sucursal_id: i32 = sqlx::query_scalar("INSERT INTO sucursales (nombre) VALUES ('Central') RETURNING id")
            .fetch_one(pool).await.unwrap();
        let caja_id: Uuid = sqlx::query_scalar(
            "INSERT INTO cajas (sucursal_id, usuario_id) VALUES ($1, $2) RETURNING id",
        )
            .bind(sucursal_id)
            .bind(usuario_id)
            .fetch_one(pool).await.unwrap();
        (caja_id, usuario_id)
    }

    fn service(pool: &PgPool) -> ServicePaymentService {
        ServicePaymentService::new(
            pool.clone(),
            ServicePaymentsRepository::new(pool.clone()),
            CajaRepository::new(pool.clone()),
            PharmacyRepository::new(pool.clone()),
        )
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn payment_and_companion_movement_live_and_die_together(pool: PgPool) {
        let (caja_id, usuario_id) = seed_caja(&pool).await;
        let svc = service(&pool);

        let pago = svc
            .create(
                CreatePagoServicioPayload {
                    caja_id,
                    tipo_servicio: "ANDE".into(),
                    moneda: Moneda::GS,
                    monto: dec!(250000),
                    observacion: None,
                },
                usuario_id,
            )
            .await
            .unwrap();

        let (concepto, monto): (String, rust_decimal::Decimal) = sqlx::query_as(
            "SELECT concepto, monto FROM movimientos_farmacia WHERE pago_servicio_id = $1",
        )
            .bind(pago.id)
            .fetch_one(&pool).await.unwrap();
        assert_eq!(concepto, "Pago de servicio - ANDE");
        assert_eq!(monto, dec!(-250000));

        svc.delete(pago.id).await.unwrap();
        let restantes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movimientos_farmacia")
            .fetch_one(&pool).await.unwrap();
        assert_eq!(restantes, 0);
    }

    fn ande(caja_id: Uuid, monto: rust_decimal::Decimal) -> CreatePagoServicioPayload {
        CreatePagoServicioPayload {
            caja_id,
            tipo_servicio: "ANDE".into(),
            moneda: Moneda::GS,
            monto,
            observacion: None,
        }
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn update_rewrites_payment_and_its_companion_movement(pool: PgPool) {
        let (caja_id, usuario_id) = seed_caja(&pool).await;
        let svc = service(&pool);
        let pago = svc.create(ande(caja_id, dec!(250000)), usuario_id).await.unwrap();

        let mut cambio = ande(caja_id, dec!(40));
        cambio.tipo_servicio = "Tigo".into();
        cambio.moneda = Moneda::USD;
        let actualizado = svc.update(pago.id, cambio, usuario_id).await.unwrap();
        assert_eq!(actualizado.id, pago.id);
        assert_eq!(actualizado.monto, dec!(40));

        let mov = PharmacyRepository::new(pool.clone())
            .find_by_service_payment(&pool, pago.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mov.concepto, "Pago de servicio - Tigo");
        assert_eq!(mov.moneda, Moneda::USD);
        assert_eq!(mov.monto, dec!(-40));

        let movimientos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movimientos_farmacia")
            .fetch_one(&pool).await.unwrap();
        assert_eq!(movimientos, 1);
        assert_eq!(svc.get(pago.id).await.unwrap().tipo_servicio, "Tigo");
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn updating_unknown_payment_writes_nothing(pool: PgPool) {
        let (caja_id, usuario_id) = seed_caja(&pool).await;
        let err = service(&pool)
            .update(Uuid::new_v4(), ande(caja_id, dec!(1000)), usuario_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let movimientos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movimientos_farmacia")
            .fetch_one(&pool).await.unwrap();
        assert_eq!(movimientos, 0);
    }

    #[sqlx::test]
    #[ignore = "requiere DATABASE_URL"]
    async fn deleting_unknown_payment_is_not_found(pool: PgPool) {
        let err = service(&pool).delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

// src/services/bank_operation_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        uploads::{ReceiptStorage, UploadedFile},
    },
    db::{BankOperationsRepository, CajaRepository, PharmacyRepository},
    models::{
        bank_operations::{CuentaBancariaRef, OperacionBancaria, OperacionBancariaPayload, TipoOperacion},
        currency::Moneda,
        pharmacy::{NuevoMovimientoFarmacia, OrigenMovimiento},
    },
};

/// Recargo fijo sobre cobros POS en moneda extranjera (6 %).
pub const POS_FOREIGN_SURCHARGE: Decimal = Decimal::from_parts(106, 0, 0, false, 2);

/// Monto y moneda del movimiento de farmacia que genera una operación.
/// Siempre es un egreso, así que el monto sale negativo.
pub fn derive_pharmacy_entry(input: &OperacionBancariaPayload) -> Result<(Moneda, Decimal), AppError> {
    if input.tipo == TipoOperacion::Pos {
        if let (Some(moneda), Some(original)) = (input.moneda_pos, input.monto_original) {
            if !moneda.is_local() {
                let recargado = original
                    .checked_mul(POS_FOREIGN_SURCHARGE)
                    .ok_or_else(|| AppError::BadRequest("El monto original excede el rango numérico.".into()))?;
                return Ok((moneda, -recargado));
            }
        }
    }

    let monto = input.monto_a_cobrar.unwrap_or(input.monto);
    Ok((Moneda::GS, -monto))
}

/// Referencia legible de la operación para el concepto del movimiento.
pub enum ConceptoRef<'a> {
    Pos {
        nombre_dispositivo: Option<&'a str>,
        codigo_barra: Option<&'a str>,
    },
    Transferencia(&'a CuentaBancariaRef),
}

pub fn build_concept(referencia: ConceptoRef<'_>, tipo_servicio: &str) -> String {
    let base = match referencia {
        ConceptoRef::Pos { nombre_dispositivo, codigo_barra } => {
            match nombre_dispositivo.or(codigo_barra).filter(|s| !s.trim().is_empty()) {
                Some(nombre) => format!("POS {}", nombre.trim()),
                None => "POS".to_string(),
            }
        }
        ConceptoRef::Transferencia(cuenta) => {
            format!("Transferencia {} - {}", cuenta.banco, cuenta.numero_cuenta)
        }
    };

    format!("{} - {}", base, tipo_servicio)
}

#[derive(Clone)]
pub struct BankOperationService {
    pool: PgPool,
    repo: BankOperationsRepository,
    caja_repo: CajaRepository,
    pharmacy_repo: PharmacyRepository,
    storage: ReceiptStorage,
}

impl BankOperationService {
    pub fn new(
        pool: PgPool,
        repo: BankOperationsRepository,
        caja_repo: CajaRepository,
        pharmacy_repo: PharmacyRepository,
        storage: ReceiptStorage,
    ) -> Self {
        Self { pool, repo, caja_repo, pharmacy_repo, storage }
    }

    pub async fn list(&self, caja_id: Option<Uuid>) -> Result<Vec<OperacionBancaria>, AppError> {
        self.repo.list(caja_id).await
    }

    pub async fn get(&self, id: Uuid) -> Result<OperacionBancaria, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Operación bancaria no encontrada.".into()))
    }

    pub async fn create(
        &self,
        input: OperacionBancariaPayload,
        comprobante: Option<UploadedFile>,
        usuario_id: i32,
    ) -> Result<OperacionBancaria, AppError> {
        let cuenta = self.check_references(&input).await?;

        // El archivo se escribe antes de la transacción; si esta falla, se borra.
        let saved = self.save_receipt(comprobante).await?;

        match self.create_in_tx(&input, saved.as_deref(), cuenta.as_ref(), usuario_id).await {
            Ok(operacion) => {
                tracing::info!(
                    "✅ Operación bancaria {} creada ({:?}, caja {})",
                    operacion.id, operacion.tipo, operacion.caja_id
                );
                Ok(operacion)
            }
            Err(e) => {
                self.discard_receipt(saved.as_deref()).await;
                Err(e)
            }
        }
    }

    async fn create_in_tx(
        &self,
        input: &OperacionBancariaPayload,
        comprobante: Option<&str>,
        cuenta: Option<&CuentaBancariaRef>,
        usuario_id: i32,
    ) -> Result<OperacionBancaria, AppError> {
        let mut tx = self.pool.begin().await?;

        let operacion = self.repo
            .insert(&mut *tx, input, comprobante, usuario_id)
            .await?;

        if input.crear_movimiento_farmacia {
            let movimiento = self
                .linked_movement(&mut tx, input, cuenta, operacion.id, usuario_id)
                .await?;
            self.pharmacy_repo.insert(&mut *tx, &movimiento).await?;
        }

        tx.commit().await?;
        Ok(operacion)
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: OperacionBancariaPayload,
        comprobante: Option<UploadedFile>,
        usuario_id: i32,
    ) -> Result<OperacionBancaria, AppError> {
        let existing = self.get(id).await?;
        let cuenta = self.check_references(&input).await?;

        let saved = self.save_receipt(comprobante).await?;
        let receipt = saved.as_deref().or(existing.comprobante.as_deref());

        let operacion = match self.update_in_tx(id, &input, receipt, cuenta.as_ref(), usuario_id).await {
            Ok(operacion) => operacion,
            Err(e) => {
                self.discard_receipt(saved.as_deref()).await;
                return Err(e);
            }
        };

        // El comprobante reemplazado se borra recién después del commit.
        if saved.is_some() {
            if let Some(old) = existing.comprobante.as_deref() {
                self.storage.remove_best_effort(old).await;
            }
        }

        tracing::info!("Operación bancaria {} actualizada", operacion.id);
        Ok(operacion)
    }

    async fn update_in_tx(
        &self,
        id: Uuid,
        input: &OperacionBancariaPayload,
        comprobante: Option<&str>,
        cuenta: Option<&CuentaBancariaRef>,
        usuario_id: i32,
    ) -> Result<OperacionBancaria, AppError> {
        let mut tx = self.pool.begin().await?;

        let operacion = self.repo
            .update(&mut *tx, id, input, comprobante)
            .await?
            .ok_or_else(|| AppError::NotFound("Operación bancaria no encontrada.".into()))?;

        if input.crear_movimiento_farmacia {
            let movimiento = self
                .linked_movement(&mut tx, input, cuenta, operacion.id, usuario_id)
                .await?;

            match self.pharmacy_repo.find_by_bank_operation(&mut *tx, operacion.id).await? {
                Some(actual) => {
                    self.pharmacy_repo.update_amounts(&mut *tx, actual.id, &movimiento).await?;
                }
                None => {
                    self.pharmacy_repo.insert(&mut *tx, &movimiento).await?;
                }
            }
        }

        tx.commit().await?;
        Ok(operacion)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let existing = self.get(id).await?;

        let mut tx = self.pool.begin().await?;

        let linked = self.pharmacy_repo
            .delete_by_bank_operation(&mut *tx, id)
            .await?;

        let deleted = self.repo.delete(&mut *tx, id).await?;
        if !deleted {
            return Err(AppError::NotFound("Operación bancaria no encontrada.".into()));
        }

        tx.commit().await?;

        if let Some(path) = existing.comprobante.as_deref() {
            self.storage.remove_best_effort(path).await;
        }

        tracing::info!("🗑️ Operación bancaria {} eliminada ({} movimiento(s) vinculados)", id, linked);
        Ok(())
    }

    pub async fn set_verification(
        &self,
        id: Uuid,
        verificado: bool,
        usuario_id: i32,
    ) -> Result<OperacionBancaria, AppError> {
        let operacion = self.repo
            .set_verification(id, verificado, usuario_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Operación bancaria no encontrada.".into()))?;

        tracing::info!(
            "Operación bancaria {} marcada como {} por el usuario {}",
            id,
            if verificado { "verificada" } else { "no verificada" },
            usuario_id
        );
        Ok(operacion)
    }

    // Caja obligatoria; la cuenta bancaria solo para transferencias.
    async fn check_references(
        &self,
        input: &OperacionBancariaPayload,
    ) -> Result<Option<CuentaBancariaRef>, AppError> {
        if !self.caja_repo.exists(input.caja_id).await? {
            return Err(AppError::NotFound("La caja no existe.".into()));
        }

        if input.tipo != TipoOperacion::Transferencia {
            return Ok(None);
        }

        let cuenta_id = input
            .cuenta_bancaria_id
            .ok_or_else(|| AppError::BadRequest("Las transferencias requieren una cuenta bancaria.".into()))?;

        let cuenta = self.repo
            .find_bank_account(&self.pool, cuenta_id)
            .await?
            .ok_or_else(|| AppError::NotFound("La cuenta bancaria no existe.".into()))?;

        Ok(Some(cuenta))
    }

    async fn linked_movement(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &OperacionBancariaPayload,
        cuenta: Option<&CuentaBancariaRef>,
        operacion_id: Uuid,
        usuario_id: i32,
    ) -> Result<NuevoMovimientoFarmacia, AppError> {
        let concepto = match (input.tipo, cuenta) {
            (TipoOperacion::Transferencia, Some(cuenta)) => {
                build_concept(ConceptoRef::Transferencia(cuenta), &input.tipo_servicio)
            }
            _ => {
                let nombre = match input.pos_codigo_barra.as_deref() {
                    Some(codigo) => self.repo.find_pos_device_name(&mut **tx, codigo).await?,
                    None => None,
                };
                build_concept(
                    ConceptoRef::Pos {
                        nombre_dispositivo: nombre.as_deref(),
                        codigo_barra: input.pos_codigo_barra.as_deref(),
                    },
                    &input.tipo_servicio,
                )
            }
        };

        let (moneda, monto) = derive_pharmacy_entry(input)?;

        Ok(NuevoMovimientoFarmacia {
            concepto,
            moneda,
            monto,
            origen: OrigenMovimiento::OperacionBancaria,
            operacion_bancaria_id: Some(operacion_id),
            pago_servicio_id: None,
            usuario_id: Some(usuario_id),
        })
    }

    async fn save_receipt(&self, comprobante: Option<UploadedFile>) -> Result<Option<String>, AppError> {
        match comprobante {
            Some(file) => Ok(Some(self.storage.save(file.file_name.as_deref(), &file.bytes).await?)),
            None => Ok(None),
        }
    }

    async fn discard_receipt(&self, saved: Option<&str>) {
        if let Some(path) = saved {
            tracing::warn!("Transacción fallida, se descarta el comprobante {}", path);
            self.storage.remove_best_effort(path).await;
        }
    }
}
